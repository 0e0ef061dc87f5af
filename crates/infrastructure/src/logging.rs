//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::{ConfigError, LogFormat, LogLevel};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .try_init()
                .map_err(|e| ConfigError::Validation {
                    field: "agent.log_format".to_string(),
                    message: format!("failed to init logging: {e}"),
                })?;
        }
        LogFormat::Text => {
            registry
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()
                .map_err(|e| ConfigError::Validation {
                    field: "agent.log_format".to_string(),
                    message: format!("failed to init logging: {e}"),
                })?;
        }
    }
    Ok(())
}
