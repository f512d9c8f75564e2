use crate::api::{
    self,
    email::Mailer,
    handlers::auth::{configured_providers, AuthConfig, AuthState, CounterStore, FixedWindowLimiter},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub redis_url: String,
    pub base_url: String,
    pub token_ttl_seconds: i64,
    pub resend_limit: u32,
    pub resend_window_seconds: i64,
    pub email_from: String,
    pub email_api_url: String,
    pub email_api_key: Option<SecretString>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a client cannot be constructed or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // All clients are constructed here and injected into the router; nothing
    // is initialized at import time, so a bad configuration fails at startup.
    let mailer = match args.email_api_key {
        Some(api_key) => Mailer::http(args.email_api_url, api_key, args.email_from)?,
        None => {
            info!("No email API key configured, logging emails instead of sending");
            Mailer::log()
        }
    };

    let redis_pool = deadpool_redis::Config::from_url(&args.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .context("Failed to create counter store pool")?;
    let limiter = FixedWindowLimiter::new(CounterStore::redis(redis_pool));

    let config = AuthConfig::new(args.base_url)
        .with_token_ttl_seconds(args.token_ttl_seconds)
        .with_resend_limit(args.resend_limit)
        .with_resend_window_seconds(args.resend_window_seconds);

    let state = Arc::new(AuthState::new(
        config,
        limiter,
        mailer,
        configured_providers(),
    ));

    api::new(args.port, args.dsn, state).await
}
