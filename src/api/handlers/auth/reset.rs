//! Password reset: request a link, then confirm with a new password.

use axum::{extract::Extension, response::Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::error::AuthError;
use super::password::hash_password;
use super::state::AuthState;
use super::storage;
use super::tokens::{self, TokenError, TokenPurpose};
use super::types::{MessageResponse, RequestResetRequest, ResetPasswordRequest};
use super::utils::{build_reset_url, normalize_email, valid_email};
use crate::api::email::EmailMessage;

const RESET_SENT: &str = "If that email exists, a reset link has been sent.";

/// Request a password-reset link.
///
/// The response is identical for known and unknown addresses, including when
/// delivery fails: returning an error only for addresses that exist would
/// turn this endpoint into an account-existence oracle.
#[utoipa::path(
    post,
    path = "/request-reset",
    request_body = RequestResetRequest,
    responses(
        (status = 200, description = "Accepted; same body for any address", body = MessageResponse),
        (status = 400, description = "Missing or malformed email", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn request_reset(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<RequestResetRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let email = match request.email.as_deref().map(normalize_email) {
        Some(email) if !email.is_empty() => email,
        _ => return Err(AuthError::Validation("Email is required".to_string())),
    };
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if storage::find_user_by_email(&pool, &email).await?.is_none() {
        return Ok(Json(MessageResponse::new(RESET_SENT)));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;
    let token = tokens::issue(
        &mut tx,
        &tokens::reset_identifier(&email),
        state.config().token_ttl_seconds(),
    )
    .await?;
    tx.commit()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    let reset_url = build_reset_url(state.config().base_url(), &token);
    if let Err(err) = state
        .mailer()
        .send(&EmailMessage::password_reset(&email, &reset_url))
        .await
    {
        // Swallow the failure; the body must not reveal the account exists.
        error!("failed to send password reset email: {err:?}");
    }

    Ok(Json(MessageResponse::new(RESET_SENT)))
}

/// Consume a reset token and set the new password, atomically.
#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Missing fields, unknown or expired token", body = MessageResponse),
        (status = 404, description = "Token valid but user missing", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(pool): Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let (token, password) = match (request.token.as_deref(), request.password.as_deref()) {
        (Some(token), Some(password)) if !token.is_empty() && !password.is_empty() => {
            (token, password)
        }
        _ => {
            return Err(AuthError::Validation(
                "Token and password are required".to_string(),
            ));
        }
    };
    if password.len() < 6 {
        return Err(AuthError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    // Hash outside the transaction; argon2 is deliberately slow.
    let password_hash = hash_password(password)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to hash password: {err}")))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    let context = match tokens::take(&mut tx, token).await {
        Ok(context) => context,
        Err(err) => {
            tx.rollback()
                .await
                .map_err(|err| AuthError::Internal(err.into()))?;
            return Err(match err {
                TokenError::NotFound => AuthError::TokenNotFound,
                TokenError::Expired => AuthError::TokenExpired,
                TokenError::Store(err) => AuthError::Internal(err),
            });
        }
    };

    if context.purpose != TokenPurpose::PasswordReset {
        tx.rollback()
            .await
            .map_err(|err| AuthError::Internal(err.into()))?;
        return Err(AuthError::TokenNotFound);
    }

    if !storage::update_password_hash(&mut tx, &context.email, &password_hash).await? {
        tx.rollback()
            .await
            .map_err(|err| AuthError::Internal(err.into()))?;
        return Err(AuthError::NotFound("User not found".to_string()));
    }

    tx.commit()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully",
    )))
}
