//! Outbound email arguments.
//!
//! Without an API key the service falls back to the log-only sender, which is
//! the intended mode for local development.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_EMAIL_FROM: &str = "email-from";
pub const ARG_EMAIL_API_URL: &str = "email-api-url";
pub const ARG_EMAIL_API_KEY: &str = "email-api-key";

#[derive(Debug)]
pub struct Options {
    pub from: String,
    pub api_url: String,
    pub api_key: Option<SecretString>,
}

impl Options {
    /// Extract email options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            from: matches
                .get_one::<String>(ARG_EMAIL_FROM)
                .cloned()
                .context("missing required argument: --email-from")?,
            api_url: matches
                .get_one::<String>(ARG_EMAIL_API_URL)
                .cloned()
                .context("missing required argument: --email-api-url")?,
            api_key: matches
                .get_one::<String>(ARG_EMAIL_API_KEY)
                .cloned()
                .map(SecretString::from),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_EMAIL_FROM)
                .long(ARG_EMAIL_FROM)
                .help("Sender address used for verification and reset emails")
                .default_value("NimbusAuth <no-reply@nimbusauth.com>")
                .env("NIMBUS_EMAIL_FROM"),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_URL)
                .long(ARG_EMAIL_API_URL)
                .help("Transactional email API endpoint")
                .default_value("https://api.resend.com/emails")
                .env("NIMBUS_EMAIL_API_URL"),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("Transactional email API key (omit to log emails instead of sending)")
                .env("NIMBUS_EMAIL_API_KEY"),
        )
}
