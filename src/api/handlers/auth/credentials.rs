//! Credential authentication against the identity store.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::error::AuthError;
use super::password::verify_password;
use super::storage;

/// Authenticated identity, safe to hand to the session layer.
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub username: Option<String>,
}

/// Validate a login/password pair.
///
/// Unknown account, missing password hash (OAuth-only account) and wrong
/// password all collapse into `InvalidCredentials` so responses do not leak
/// which accounts exist. The verification gate is only checked after the
/// password matches, keeping the unverified message from acting as an
/// account-existence oracle for wrong passwords.
///
/// # Errors
/// `Validation` for empty fields, `InvalidCredentials` on mismatch,
/// `EmailNotVerified` when the password matches an unverified account.
pub async fn authenticate(
    pool: &PgPool,
    login: &str,
    password: &str,
) -> Result<IdentitySummary, AuthError> {
    let login = login.trim();
    if login.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "Email/Username and password are required".to_string(),
        ));
    }

    let Some(record) = storage::find_credentials(pool, login).await? else {
        return Err(AuthError::InvalidCredentials);
    };

    let Some(password_hash) = record.password_hash.as_deref() else {
        return Err(AuthError::InvalidCredentials);
    };

    let matches = verify_password(password, password_hash).unwrap_or_else(|err| {
        // Corrupt hash in the store; treat as mismatch but leave a trace.
        error!("failed to parse stored password hash: {err}");
        false
    });
    if !matches {
        return Err(AuthError::InvalidCredentials);
    }

    if !record.verified {
        return Err(AuthError::EmailNotVerified);
    }

    Ok(IdentitySummary {
        id: record.id,
        email: record.email,
        name: record.name,
        image: record.image,
        username: record.username,
    })
}
