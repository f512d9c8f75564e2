use anyhow::Result;
use std::env::var;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initialize logging.
///
/// Output is pretty-printed for humans by default; set
/// `NIMBUS_LOG_FORMAT=json` for structured output.
///
/// # Errors
///
/// Returns an error if subscriber initialization fails
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?);

    let json_output = var("NIMBUS_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json_output {
        let fmt_layer = fmt::layer().with_target(false).json();
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .pretty();
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
