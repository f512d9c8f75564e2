//! Auth configuration and shared request state.

use super::providers::Provider;
use super::rate_limit::FixedWindowLimiter;
use crate::api::email::Mailer;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_RESEND_LIMIT: u32 = 3;
const DEFAULT_RESEND_WINDOW_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    token_ttl_seconds: i64,
    resend_limit: u32,
    resend_window_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            resend_limit: DEFAULT_RESEND_LIMIT,
            resend_window_seconds: DEFAULT_RESEND_WINDOW_SECONDS,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_resend_limit(mut self, limit: u32) -> Self {
        self.resend_limit = limit;
        self
    }

    #[must_use]
    pub fn with_resend_window_seconds(mut self, seconds: i64) -> Self {
        self.resend_window_seconds = seconds;
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    pub(crate) fn resend_limit(&self) -> u32 {
        self.resend_limit
    }

    pub(crate) fn resend_window_seconds(&self) -> i64 {
        self.resend_window_seconds
    }
}

/// Shared state injected into every handler; constructed once at startup.
#[derive(Clone, Debug)]
pub struct AuthState {
    config: AuthConfig,
    limiter: FixedWindowLimiter,
    mailer: Mailer,
    providers: Vec<Provider>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        limiter: FixedWindowLimiter,
        mailer: Mailer,
        providers: Vec<Provider>,
    ) -> Self {
        Self {
            config,
            limiter,
            mailer,
            providers,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_resend_policy() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        assert_eq!(config.token_ttl_seconds(), 3600);
        assert_eq!(config.resend_limit(), 3);
        assert_eq!(config.resend_window_seconds(), 3600);
    }

    #[test]
    fn config_builders_override_defaults() {
        let config = AuthConfig::new("https://auth.nimbusauth.com".to_string())
            .with_token_ttl_seconds(900)
            .with_resend_limit(5)
            .with_resend_window_seconds(600);
        assert_eq!(config.base_url(), "https://auth.nimbusauth.com");
        assert_eq!(config.token_ttl_seconds(), 900);
        assert_eq!(config.resend_limit(), 5);
        assert_eq!(config.resend_window_seconds(), 600);
    }
}
