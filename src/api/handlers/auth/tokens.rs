//! Single-use token lifecycle.
//!
//! Tokens live in one table for both flows; password-reset identifiers carry
//! a namespace prefix so a verification token can never be replayed as a
//! reset token (or vice versa). Only a sha256 digest of the token is stored;
//! the raw value exists solely in the emailed link.

use anyhow::Result;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use super::storage;
use super::utils::{generate_token, hash_token};

/// Identifier prefix for password-reset tokens.
pub(super) const RESET_NAMESPACE: &str = "password_reset:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

/// What a stored token was issued for, recovered from its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
    pub identifier: String,
    pub purpose: TokenPurpose,
    /// Bare email with any namespace prefix stripped.
    pub email: String,
}

impl TokenContext {
    pub(super) fn from_identifier(identifier: String) -> Self {
        match identifier.strip_prefix(RESET_NAMESPACE) {
            Some(email) => {
                let email = email.to_string();
                Self {
                    identifier,
                    purpose: TokenPurpose::PasswordReset,
                    email,
                }
            }
            None => Self {
                email: identifier.clone(),
                purpose: TokenPurpose::EmailVerification,
                identifier,
            },
        }
    }
}

/// Identifier under which reset tokens for `email` are stored.
pub(super) fn reset_identifier(email: &str) -> String {
    format!("{RESET_NAMESPACE}{email}")
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token not found")]
    NotFound,
    #[error("token expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Issue a fresh token for `identifier`, replacing any outstanding one.
///
/// Returns the raw token for inclusion in an email link. Runs inside the
/// caller's transaction so a failed email send can roll the issue back.
pub(super) async fn issue(
    tx: &mut Transaction<'_, Postgres>,
    identifier: &str,
    ttl_seconds: i64,
) -> Result<String> {
    let token = generate_token()?;
    storage::delete_tokens_for_identifier(tx, identifier).await?;
    storage::insert_token(tx, identifier, &hash_token(&token), ttl_seconds).await?;
    Ok(token)
}

/// Check a presented token without consuming it.
///
/// Useful for rendering a reset form before the user submits a new password;
/// the state-changing handlers use [`take`] instead.
pub async fn validate(pool: &PgPool, token: &str) -> Result<TokenContext, TokenError> {
    let row = storage::lookup_token(pool, &hash_token(token))
        .await?
        .ok_or(TokenError::NotFound)?;
    if row.expired {
        return Err(TokenError::Expired);
    }
    Ok(TokenContext::from_identifier(row.identifier))
}

/// Consume a presented token inside the caller's transaction.
///
/// The row is deleted by the same statement that reads it, so concurrent
/// requests presenting the same token cannot both succeed. On `Expired` the
/// caller must roll back, which restores the row until cleanup removes it.
pub(super) async fn take(
    tx: &mut Transaction<'_, Postgres>,
    token: &str,
) -> Result<TokenContext, TokenError> {
    let row = storage::take_token(tx, &hash_token(token))
        .await?
        .ok_or(TokenError::NotFound)?;
    if row.expired {
        return Err(TokenError::Expired);
    }
    Ok(TokenContext::from_identifier(row.identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifier_is_email_verification() {
        let context = TokenContext::from_identifier("alice@example.com".to_string());
        assert_eq!(context.purpose, TokenPurpose::EmailVerification);
        assert_eq!(context.email, "alice@example.com");
        assert_eq!(context.identifier, "alice@example.com");
    }

    #[test]
    fn prefixed_identifier_is_password_reset() {
        let context = TokenContext::from_identifier("password_reset:alice@example.com".to_string());
        assert_eq!(context.purpose, TokenPurpose::PasswordReset);
        assert_eq!(context.email, "alice@example.com");
        assert_eq!(context.identifier, "password_reset:alice@example.com");
    }

    #[test]
    fn reset_identifier_round_trips() {
        let identifier = reset_identifier("bob@example.com");
        let context = TokenContext::from_identifier(identifier);
        assert_eq!(context.purpose, TokenPurpose::PasswordReset);
        assert_eq!(context.email, "bob@example.com");
    }
}
