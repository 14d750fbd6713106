//! Logging setup using tracing.
//!
//! Logs always go to stderr so that stdout carries only the report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{CliError, CliResult};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `filter`. With `json`, events are written
/// as JSON lines.
pub fn init_logging(filter: &str, json: bool) -> CliResult<()> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|e| CliError::Config(format!("Invalid log filter '{filter}': {e}")))?;

    let registry = tracing_subscriber::registry().with(filter_layer);

    let result = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::env::var("NO_COLOR").is_err()),
            )
            .try_init()
    };
    result.map_err(|e| CliError::Config(format!("Failed to initialize logging: {e}")))?;

    tracing::debug!(filter = %filter, json, "Logging initialized");
    Ok(())
}
