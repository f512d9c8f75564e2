//! Error taxonomy for the auth HTTP surface.
//!
//! Every response body is a JSON object with at least a `message` field.
//! Store and delivery failures are logged server-side and answered with a
//! generic message; nothing internal reaches the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input; carries the field-level reason.
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    Conflict,

    /// Deliberately generic: wrong password and unknown account are identical.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Distinct message so clients can offer the resend flow.
    #[error("Please verify your email before signing in")]
    EmailNotVerified,

    #[error("Invalid or expired token")]
    TokenNotFound,

    #[error("Token has expired")]
    TokenExpired,

    #[error("{0}")]
    NotFound(String),

    #[error("Too many verification requests. Please try again later.")]
    RateLimited { reset_at: u64 },

    #[error("Failed to send email")]
    Delivery(#[source] anyhow::Error),

    #[error("Something went wrong")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_)
            | Self::Conflict
            | Self::InvalidCredentials
            | Self::EmailNotVerified
            | Self::TokenNotFound
            | Self::TokenExpired => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Delivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            Self::Delivery(err) | Self::Internal(err) => error!("{err:?}"),
            _ => {}
        }

        let body = match &self {
            Self::RateLimited { reset_at } => {
                json!({ "message": self.to_string(), "reset_at": reset_at })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
