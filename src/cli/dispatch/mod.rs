//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let redis_url = matches
        .get_one::<String>("redis-url")
        .cloned()
        .context("missing required argument: --redis-url")?;
    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .context("missing required argument: --base-url")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        redis_url,
        base_url,
        token_ttl_seconds: auth_opts.token_ttl_seconds,
        resend_limit: auth_opts.resend_limit,
        resend_window_seconds: auth_opts.resend_window_seconds,
        email_from: email_opts.from,
        email_api_url: email_opts.api_url,
        email_api_key: email_opts.api_key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_required() {
        temp_env::with_vars(
            [
                ("NIMBUS_DSN", None::<&str>),
                ("NIMBUS_REDIS_URL", Some("redis://localhost:6379")),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["nimbus"]);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn server_args_from_matches() {
        temp_env::with_vars([("NIMBUS_EMAIL_API_KEY", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec![
                "nimbus",
                "--dsn",
                "postgres://user@localhost:5432/nimbus",
                "--redis-url",
                "redis://localhost:6379",
                "--base-url",
                "https://auth.nimbusauth.com",
                "--token-ttl",
                "900",
                "--resend-limit",
                "5",
            ]);
            let action = handler(&matches).expect("handler should succeed");
            let Action::Server(args) = action;
            assert_eq!(args.port, 8080);
            assert_eq!(args.base_url, "https://auth.nimbusauth.com");
            assert_eq!(args.token_ttl_seconds, 900);
            assert_eq!(args.resend_limit, 5);
            assert_eq!(args.resend_window_seconds, 3600);
            assert!(args.email_api_key.is_none());
        });
    }
}
