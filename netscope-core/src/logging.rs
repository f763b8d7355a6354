//! Structured logging setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Errors raised while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// Events go to stderr; stdout is left to command output.
/// `RUST_LOG` takes precedence over the configured level so operators can raise
/// verbosity for a single run without touching configuration files.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| LoggingError::InvalidFilter {
            filter: config.level.clone(),
            message: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "pretty" => registry
            .with(fmt::layer().with_writer(std::io::stderr).pretty())
            .try_init()?,
        "compact" => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()?,
        _ => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(true),
            )
            .try_init()?,
    }

    Ok(())
}
