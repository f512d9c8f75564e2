//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(IntoParams, Deserialize, Debug)]
pub struct VerifyEmailParams {
    /// Raw token from the emailed link.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationResponse {
    pub message: String,
    /// Requests left in the current rate-limit window.
    pub remaining: u32,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestResetRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    /// Email address or username.
    pub login: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn register_request_username_is_optional() -> Result<()> {
        let value = serde_json::json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "hunter22",
        });
        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert!(decoded.username.is_none());
        Ok(())
    }

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            login: "alice".to_string(),
            password: "hunter22".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let login = value
            .get("login")
            .and_then(serde_json::Value::as_str)
            .context("missing login")?;
        assert_eq!(login, "alice");
        Ok(())
    }
}
