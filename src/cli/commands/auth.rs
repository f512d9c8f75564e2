//! Token lifecycle and resend-throttling arguments.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_RESEND_LIMIT: &str = "resend-limit";
pub const ARG_RESEND_WINDOW: &str = "resend-window";

#[derive(Debug)]
pub struct Options {
    pub token_ttl_seconds: i64,
    pub resend_limit: u32,
    pub resend_window_seconds: i64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL)
                .copied()
                .context("missing required argument: --token-ttl")?,
            resend_limit: matches
                .get_one::<u32>(ARG_RESEND_LIMIT)
                .copied()
                .context("missing required argument: --resend-limit")?,
            resend_window_seconds: matches
                .get_one::<i64>(ARG_RESEND_WINDOW)
                .copied()
                .context("missing required argument: --resend-window")?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Lifetime in seconds of verification and reset tokens")
                .default_value("3600")
                .env("NIMBUS_TOKEN_TTL")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESEND_LIMIT)
                .long(ARG_RESEND_LIMIT)
                .help("Resend-verification requests allowed per window per email")
                .default_value("3")
                .env("NIMBUS_RESEND_LIMIT")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_RESEND_WINDOW)
                .long(ARG_RESEND_WINDOW)
                .help("Resend-verification rate limit window in seconds")
                .default_value("3600")
                .env("NIMBUS_RESEND_WINDOW")
                .value_parser(clap::value_parser!(i64)),
        )
}
