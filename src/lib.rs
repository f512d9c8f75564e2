//! # Nimbus (Identity Verification & Ephemeral Tokens)
//!
//! `nimbus` backs a credential-based sign-in flow: user registration, email
//! verification, password reset, and resend throttling.
//!
//! ## Tokens
//!
//! Verification and password-reset grants share one table of single-use,
//! time-limited tokens. The row identifier encodes the purpose: a bare email
//! is a verification token, `password_reset:<email>` is a reset token. The
//! database stores a SHA-256 digest of the token; the raw value only ever
//! appears inside the emailed link.
//!
//! Consuming a token and applying the state change it authorizes (marking an
//! email verified, setting a new password hash) happen inside a single
//! database transaction, so a token can never be used twice and a crash
//! cannot burn a grant without applying it.
//!
//! ## Rate limiting
//!
//! Resend requests are throttled with a fixed-window counter kept in a shared
//! key-value store (Redis in production, in-memory in tests). Windows reset
//! wholesale at the TTL boundary; bursts across a boundary are accepted.
//!
//! ## Sessions
//!
//! Session claims are a minimal projection of the user row (`id`, `name`,
//! `email`, `picture`, `username`) recomputed from the database on every
//! refresh. The password hash never leaves the storage layer.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
