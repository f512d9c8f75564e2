//! Outbound email delivery.
//!
//! The service only composes message content and the target address; actual
//! delivery goes through a transactional-email HTTP API. Without an API key
//! the `Log` sender logs the message and returns `Ok`, which is the intended
//! mode for local development.

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    /// Verification email carrying the raw token inside the link. The token
    /// must not appear anywhere else (logs, storage).
    #[must_use]
    pub fn verification(to: &str, verify_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            html: format!(
                "<p>Click <a href='{verify_url}'>here</a> to verify your email. \
                 This link will expire in 1 hour.</p>"
            ),
        }
    }

    #[must_use]
    pub fn password_reset(to: &str, reset_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            html: format!(
                "<p>Click <a href='{reset_url}'>here</a> to reset your password. \
                 This link will expire in 1 hour.</p>"
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Mailer {
    /// Local dev sender that logs the target and subject instead of sending.
    Log,
    /// Transactional email API sender.
    Http {
        client: reqwest::Client,
        api_url: String,
        api_key: SecretString,
        from: String,
    },
}

impl Mailer {
    #[must_use]
    pub fn log() -> Self {
        Self::Log
    }

    /// Build an HTTP sender.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn http(api_url: String, api_key: SecretString, from: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self::Http {
            client,
            api_url,
            api_key,
            from,
        })
    }

    /// Deliver a message.
    ///
    /// # Errors
    /// Returns an error when the API rejects the message or the request fails.
    pub async fn send(&self, message: &EmailMessage) -> Result<()> {
        match self {
            Self::Log => {
                // Subject and target only; the body carries the raw token link.
                info!(to = %message.to, subject = %message.subject, "email send stub");
                Ok(())
            }
            Self::Http {
                client,
                api_url,
                api_key,
                from,
            } => {
                let body = json!({
                    "from": from,
                    "to": message.to,
                    "subject": message.subject,
                    "html": message.html,
                });

                let response = client
                    .post(api_url)
                    .bearer_auth(api_key.expose_secret())
                    .json(&body)
                    .send()
                    .await
                    .context("Failed to reach email API")?;

                if !response.status().is_success() {
                    return Err(anyhow!("Email API rejected message: {}", response.status()));
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_message_embeds_link() {
        let message =
            EmailMessage::verification("alice@example.com", "https://a.example/verify?token=t1");
        assert_eq!(message.to, "alice@example.com");
        assert_eq!(message.subject, "Verify your email");
        assert!(message.html.contains("https://a.example/verify?token=t1"));
        assert!(message.html.contains("expire in 1 hour"));
    }

    #[test]
    fn reset_message_embeds_link() {
        let message =
            EmailMessage::password_reset("bob@example.com", "https://a.example/reset?token=t2");
        assert_eq!(message.subject, "Reset your password");
        assert!(message.html.contains("https://a.example/reset?token=t2"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = Mailer::log();
        let message = EmailMessage::verification("alice@example.com", "https://a.example/v");
        assert!(mailer.send(&message).await.is_ok());
    }
}
