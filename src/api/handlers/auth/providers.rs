//! OAuth provider registry.
//!
//! Evaluated once at startup from the process environment; the resulting
//! list is immutable for the lifetime of the server. A provider is enabled
//! when its flag is anything but `"false"` and every credential variable it
//! needs is present.

use axum::{extract::Extension, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::state::AuthState;

struct ProviderSpec {
    id: &'static str,
    label: &'static str,
    flag_env: &'static str,
    required_env: &'static [&'static str],
}

const PROVIDER_SPECS: &[ProviderSpec] = &[
    ProviderSpec {
        id: "google",
        label: "Google",
        flag_env: "GOOGLE_AUTH_ENABLED",
        required_env: &["GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"],
    },
    ProviderSpec {
        id: "facebook",
        label: "Facebook",
        flag_env: "FACEBOOK_AUTH_ENABLED",
        required_env: &["FACEBOOK_CLIENT_ID", "FACEBOOK_CLIENT_SECRET"],
    },
    ProviderSpec {
        id: "github",
        label: "GitHub",
        flag_env: "GITHUB_AUTH_ENABLED",
        required_env: &["GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"],
    },
    ProviderSpec {
        id: "apple",
        label: "Apple",
        flag_env: "APPLE_AUTH_ENABLED",
        required_env: &["APPLE_ID", "APPLE_SECRET"],
    },
];

/// An enabled sign-in provider, as advertised to clients.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub id: String,
    pub label: String,
}

fn providers_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<Provider> {
    PROVIDER_SPECS
        .iter()
        .filter(|spec| {
            let disabled = lookup(spec.flag_env).as_deref() == Some("false");
            let configured = spec
                .required_env
                .iter()
                .all(|var| lookup(var).is_some_and(|value| !value.is_empty()));
            !disabled && configured
        })
        .map(|spec| Provider {
            id: spec.id.to_string(),
            label: spec.label.to_string(),
        })
        .collect()
}

/// Evaluate the registry against the process environment. Called once at
/// startup; handlers read the frozen result from [`AuthState`].
#[must_use]
pub fn configured_providers() -> Vec<Provider> {
    providers_from(|var| std::env::var(var).ok())
}

#[utoipa::path(
    get,
    path = "/providers",
    responses(
        (status = 200, description = "Enabled sign-in providers", body = [Provider]),
    ),
    tag = "auth"
)]
pub async fn providers(Extension(state): Extension<Arc<AuthState>>) -> Json<Vec<Provider>> {
    Json(state.providers().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_enables_nothing() {
        assert!(providers_from(|_| None).is_empty());
    }

    #[test]
    fn provider_requires_all_credentials() {
        let vars = lookup(&[("GOOGLE_CLIENT_ID", "id")]);
        assert!(providers_from(vars).is_empty());

        let vars = lookup(&[
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
        ]);
        let providers = providers_from(vars);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "google");
        assert_eq!(providers[0].label, "Google");
    }

    #[test]
    fn flag_false_disables_even_when_configured() {
        let vars = lookup(&[
            ("GITHUB_AUTH_ENABLED", "false"),
            ("GITHUB_CLIENT_ID", "id"),
            ("GITHUB_CLIENT_SECRET", "secret"),
        ]);
        assert!(providers_from(vars).is_empty());
    }

    #[test]
    fn empty_credential_counts_as_missing() {
        let vars = lookup(&[("APPLE_ID", "id"), ("APPLE_SECRET", "")]);
        assert!(providers_from(vars).is_empty());
    }

    #[test]
    fn registry_order_is_stable() {
        let vars = lookup(&[
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("APPLE_ID", "id"),
            ("APPLE_SECRET", "secret"),
        ]);
        let ids: Vec<String> = providers_from(vars)
            .into_iter()
            .map(|provider| provider.id)
            .collect();
        assert_eq!(ids, ["google", "apple"]);
    }
}
