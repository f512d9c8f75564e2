//! Small helpers for input validation and token handling.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Usernames are 3-32 chars of `[A-Za-z0-9_-]`.
pub(super) fn valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_-]{3,32}$").is_ok_and(|regex| regex.is_match(username))
}

/// Create a new single-use token for email links (256 bits of entropy).
///
/// Returned token is only sent to the user; we store a hash in the database.
pub(super) fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a token so we never store the raw value in the database.
pub(super) fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the verification link included in outbound emails.
pub(super) fn build_verify_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}")
}

/// Build the password-reset link included in outbound emails.
pub(super) fn build_reset_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/reset-password?token={token}")
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_username_enforces_charset_and_length() {
        assert!(valid_username("alice"));
        assert!(valid_username("a_b-c99"));
        assert!(!valid_username("ab"));
        assert!(!valid_username("has space"));
        assert!(!valid_username("way-too-long-username-exceeding-limit"));
        assert!(!valid_username("em@il-like"));
    }

    #[test]
    fn build_verify_url_trims_trailing_slash() {
        let url = build_verify_url("https://nimbusauth.com/", "token");
        assert_eq!(url, "https://nimbusauth.com/verify-email?token=token");
    }

    #[test]
    fn build_reset_url_uses_reset_path() {
        let url = build_reset_url("https://nimbusauth.com", "token");
        assert_eq!(url, "https://nimbusauth.com/reset-password?token=token");
    }

    #[test]
    fn generate_token_decodes_to_32_bytes() {
        let decoded_len = generate_token()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn generate_token_is_not_repeatable() {
        let first = generate_token().ok();
        let second = generate_token().ok();
        assert!(first.is_some());
        assert_ne!(first, second);
    }

    #[test]
    fn hash_token_stable() {
        let first = hash_token("token");
        let second = hash_token("token");
        let different = hash_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
