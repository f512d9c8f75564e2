//! Session claim composition.
//!
//! Claims are re-derived from the store on every composition so a session
//! observes profile edits made after sign-in. When the store row has gone
//! missing the existing claims are kept rather than invalidating the session.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use super::credentials::IdentitySummary;
use super::storage::{self, ClaimsRecord};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub username: Option<String>,
}

impl Claims {
    #[must_use]
    pub fn from_identity(identity: &IdentitySummary) -> Self {
        Self {
            id: identity.id.to_string(),
            name: identity.name.clone(),
            email: Some(identity.email.clone()),
            picture: identity.image.clone(),
            username: identity.username.clone(),
        }
    }

    fn from_record(record: ClaimsRecord) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            email: Some(record.email),
            picture: record.image,
            username: record.username,
        }
    }
}

/// Compose session claims from existing claims and, at sign-in, the freshly
/// authenticated identity.
///
/// Lookup prefers the fresh identity's id; on later refreshes the existing
/// claims' id (or email, when the id does not parse) drives the lookup.
///
/// # Errors
/// Only store failures error out; a missing row falls back to the inputs.
pub async fn compose_claims(
    pool: &PgPool,
    existing: &Claims,
    fresh: Option<&IdentitySummary>,
) -> Result<Claims> {
    let record = match fresh {
        Some(identity) => storage::find_claims_by_id(pool, identity.id).await?,
        None => match existing.id.parse::<Uuid>() {
            Ok(id) => storage::find_claims_by_id(pool, id).await?,
            Err(_) => match existing.email.as_deref() {
                Some(email) => storage::find_claims_by_email(pool, email).await?,
                None => None,
            },
        },
    };

    if let Some(record) = record {
        return Ok(Claims::from_record(record));
    }

    // Row missing: keep what we have, but let a fresh sign-in pin the id.
    let mut claims = existing.clone();
    if let Some(identity) = fresh {
        claims.id = identity.id.to_string();
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> IdentitySummary {
        IdentitySummary {
            id: Uuid::nil(),
            email: "alice@example.com".to_string(),
            name: Some("Alice".to_string()),
            image: None,
            username: Some("alice".to_string()),
        }
    }

    #[test]
    fn claims_from_identity_copies_fields() {
        let claims = Claims::from_identity(&identity());
        assert_eq!(claims.id, Uuid::nil().to_string());
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.name.as_deref(), Some("Alice"));
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert!(claims.picture.is_none());
    }

    #[test]
    fn claims_serialize_with_picture_field() {
        let claims = Claims::from_identity(&identity());
        let value = serde_json::to_value(&claims).ok();
        let has_picture = value
            .as_ref()
            .and_then(|value| value.get("picture"))
            .is_some();
        assert!(has_picture);
    }
}
