//! Email verification and resend.

use axum::{
    extract::{Extension, Query},
    response::Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::error::AuthError;
use super::state::AuthState;
use super::storage;
use super::tokens::{self, TokenError, TokenPurpose};
use super::types::{
    MessageResponse, ResendVerificationRequest, ResendVerificationResponse, VerifyEmailParams,
};
use super::utils::{build_verify_url, normalize_email, valid_email};
use crate::api::email::EmailMessage;

/// Consume a verification token and mark the account verified.
///
/// Consumption and the flag flip share one transaction: if anything after
/// the `DELETE .. RETURNING` fails the rollback restores the token, so a
/// user can retry the same link.
#[utoipa::path(
    get,
    path = "/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Missing, unknown or expired token", body = MessageResponse),
        (status = 404, description = "Token valid but user missing", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    Extension(pool): Extension<PgPool>,
    Query(params): Query<VerifyEmailParams>,
) -> Result<Json<MessageResponse>, AuthError> {
    let token = match params.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return Err(AuthError::Validation("Token is required".to_string())),
    };

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    let context = match tokens::take(&mut tx, &token).await {
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

    if context.purpose != TokenPurpose::EmailVerification {
        tx.rollback()
            .await
            .map_err(|err| AuthError::Internal(err.into()))?;
        return Err(AuthError::TokenNotFound);
    }

    if !storage::mark_email_verified(&mut tx, &context.email).await? {
        tx.rollback()
            .await
            .map_err(|err| AuthError::Internal(err.into()))?;
        return Err(AuthError::NotFound("User not found".to_string()));
    }

    tx.commit()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// Re-issue a verification token, throttled per email address.
///
/// The limiter is consulted before any store reads, so probing attempts burn
/// window slots even for unknown addresses.
#[utoipa::path(
    post,
    path = "/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = ResendVerificationResponse),
        (status = 400, description = "Invalid email or already verified", body = MessageResponse),
        (status = 404, description = "No account with this email", body = MessageResponse),
        (status = 429, description = "Resend window exhausted", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> Result<Json<ResendVerificationResponse>, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    let verdict = state
        .limiter()
        .check(
            &format!("resend-verification:{email}"),
            state.config().resend_limit(),
            state.config().resend_window_seconds(),
        )
        .await?;
    if !verdict.allowed {
        return Err(AuthError::RateLimited {
            reset_at: verdict.reset_at,
        });
    }

    let Some(user) = storage::find_user_by_email(&pool, &email).await? else {
        return Err(AuthError::NotFound(
            "No account found with this email".to_string(),
        ));
    };
    if user.verified {
        return Err(AuthError::Validation(
            "Email is already verified".to_string(),
        ));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;
    let token = tokens::issue(&mut tx, &email, state.config().token_ttl_seconds()).await?;
    tx.commit()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    let verify_url = build_verify_url(state.config().base_url(), &token);
    state
        .mailer()
        .send(&EmailMessage::verification(&email, &verify_url))
        .await
        .map_err(AuthError::Delivery)?;

    Ok(Json(ResendVerificationResponse {
        message: "Verification email sent".to_string(),
        remaining: verdict.remaining,
    }))
}
