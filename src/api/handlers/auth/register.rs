//! User registration.

use axum::{extract::Extension, http::StatusCode, response::Json};
use sqlx::PgPool;
use std::sync::Arc;

use super::error::AuthError;
use super::password::hash_password;
use super::state::AuthState;
use super::storage::{self, InsertUserOutcome};
use super::tokens;
use super::types::{MessageResponse, RegisterRequest};
use super::utils::{build_verify_url, normalize_email, valid_email, valid_username};
use crate::api::email::EmailMessage;

/// Create an unverified account and email a verification link.
///
/// The pre-check and insert run in one transaction; the unique constraint
/// remains the authority for concurrent duplicates. The token is only
/// committed if issuing succeeds, and the email is sent after commit so a
/// delivery failure never leaves a half-registered user without a token.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Validation failure or duplicate identity", body = MessageResponse),
        (status = 500, description = "Store or delivery failure", body = MessageResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation("Missing payload".to_string()));
    };

    let name = request.name.trim();
    if name.len() < 2 {
        return Err(AuthError::Validation(
            "Name must be at least 2 characters".to_string(),
        ));
    }

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if request.password.len() < 6 {
        return Err(AuthError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let username = match request.username.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(username) if valid_username(username) => Some(username),
        Some(_) => {
            return Err(AuthError::Validation(
                "Username must be 3-32 characters (letters, digits, _ or -)".to_string(),
            ));
        }
    };

    let password_hash = hash_password(&request.password)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to hash password: {err}")))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| AuthError::Internal(err.into()))?;

    if storage::identity_taken(&mut tx, &email, username).await? {
        tx.rollback()
            .await
            .map_err(|err| AuthError::Internal(err.into()))?;
        return Err(AuthError::Conflict);
    }

    match storage::insert_user(&mut tx, name, username, &email, &password_hash).await? {
        InsertUserOutcome::Created => {}
        InsertUserOutcome::Conflict => {
            tx.rollback()
                .await
                .map_err(|err| AuthError::Internal(err.into()))?;
            return Err(AuthError::Conflict);
        }
    }

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

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully")),
    ))
}
