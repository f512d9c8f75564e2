//! Database helpers for identity and token state.
//!
//! All statements are single-row and lean on the store's unique constraints
//! and per-row atomicity; no in-process locking exists anywhere in the
//! service.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub(super) enum InsertUserOutcome {
    Created,
    /// Unique constraint rejected the row (concurrent duplicate registration).
    Conflict,
}

/// Credential fields needed to authenticate a login attempt.
pub(super) struct CredentialRecord {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) name: Option<String>,
    pub(super) image: Option<String>,
    pub(super) username: Option<String>,
    pub(super) password_hash: Option<String>,
    pub(super) verified: bool,
}

/// Minimal user fields for the verification flows.
pub(super) struct UserRecord {
    pub(super) verified: bool,
}

/// Fields projected into session claims.
pub(super) struct ClaimsRecord {
    pub(super) id: Uuid,
    pub(super) name: Option<String>,
    pub(super) email: String,
    pub(super) image: Option<String>,
    pub(super) username: Option<String>,
}

/// A token row as seen at consumption time.
pub(super) struct TokenRow {
    pub(super) identifier: String,
    pub(super) expired: bool,
}

/// Look up credentials by email or username in a single query.
pub(super) async fn find_credentials(
    pool: &PgPool,
    login: &str,
) -> Result<Option<CredentialRecord>> {
    let query = r"
        SELECT id, email, name, image, username, password_hash,
               email_verified_at IS NOT NULL AS verified
        FROM users
        WHERE email = $1 OR username = $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(login.to_lowercase())
        .bind(login)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup credentials")?;

    Ok(row.map(|row| CredentialRecord {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        image: row.get("image"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        verified: row.get("verified"),
    }))
}

pub(super) async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = "SELECT email_verified_at IS NOT NULL AS verified FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    Ok(row.map(|row| UserRecord {
        verified: row.get("verified"),
    }))
}

pub(super) async fn find_claims_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ClaimsRecord>> {
    let query = "SELECT id, name, email, image, username FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup claims by id")?;

    Ok(row.map(claims_record))
}

pub(super) async fn find_claims_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<ClaimsRecord>> {
    let query = "SELECT id, name, email, image, username FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup claims by email")?;

    Ok(row.map(claims_record))
}

fn claims_record(row: sqlx::postgres::PgRow) -> ClaimsRecord {
    ClaimsRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        image: row.get("image"),
        username: row.get("username"),
    }
}

/// Check whether the email or username is already taken.
///
/// The follow-up insert still races with concurrent registrations; the unique
/// constraint is the authority and surfaces as `Conflict`.
pub(super) async fn identity_taken(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    username: Option<&str>,
) -> Result<bool> {
    let query = r"
        SELECT EXISTS(
            SELECT 1 FROM users WHERE email = $1 OR ($2::text IS NOT NULL AND username = $2)
        ) AS taken
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(username)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await
        .context("failed to check if identity is taken")?;

    Ok(row.get("taken"))
}

pub(super) async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    username: Option<&str>,
    email: &str,
    password_hash: &str,
) -> Result<InsertUserOutcome> {
    let query = r"
        INSERT INTO users (name, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .execute(&mut **tx)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(InsertUserOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Flip the verified flag. `COALESCE` keeps the timestamp monotonic: once
/// set, a second verification cannot move or clear it.
pub(super) async fn mark_email_verified(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET email_verified_at = COALESCE(email_verified_at, NOW()),
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(email)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn update_password_hash(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password_hash: &str,
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to update password hash")?;

    Ok(result.rows_affected() > 0)
}

/// Drop any live tokens for an identifier before re-issuing, keeping at most
/// one live token per identifier.
pub(super) async fn delete_tokens_for_identifier(
    tx: &mut Transaction<'_, Postgres>,
    identifier: &str,
) -> Result<()> {
    let query = "DELETE FROM verification_tokens WHERE identifier = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(identifier)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to delete prior tokens")?;

    Ok(())
}

pub(super) async fn insert_token(
    tx: &mut Transaction<'_, Postgres>,
    identifier: &str,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO verification_tokens (identifier, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(identifier)
        .bind(token_hash)
        .bind(ttl_seconds)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert token")?;

    Ok(())
}

/// Read-only token lookup; expiry is reported as a predicate, the row stays.
pub(super) async fn lookup_token(pool: &PgPool, token_hash: &[u8]) -> Result<Option<TokenRow>> {
    let query = r"
        SELECT identifier, (expires_at <= NOW()) AS expired
        FROM verification_tokens
        WHERE token_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup token")?;

    Ok(row.map(token_row))
}

/// Atomically remove a token and return what it was. Two requests racing on
/// the same value cannot both get a row back. Callers must roll back the
/// surrounding transaction when the returned row is expired, leaving it in
/// place for eventual cleanup.
pub(super) async fn take_token(
    tx: &mut Transaction<'_, Postgres>,
    token_hash: &[u8],
) -> Result<Option<TokenRow>> {
    let query = r"
        DELETE FROM verification_tokens
        WHERE token_hash = $1
        RETURNING identifier, (expires_at <= NOW()) AS expired
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(&mut **tx)
        .instrument(span)
        .await
        .context("failed to consume token")?;

    Ok(row.map(token_row))
}

fn token_row(row: sqlx::postgres::PgRow) -> TokenRow {
    TokenRow {
        identifier: row.get("identifier"),
        expired: row.get("expired"),
    }
}
