//! Structured logging setup.
//!
//! Logs go through `tracing-subscriber`: an `EnvFilter` built from the
//! configured level, then either a human-readable or a JSON fmt layer.
//! JSON lines carry `timestamp`, `level`, `target`, `fields` and span context,
//! which log shippers can parse without extra configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the level filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(format!("invalid log level: {e}")))
}

/// Install the global subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = env_filter(config)?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()));
    }

    if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    }
}

/// Helper to create structured log entries tagged with a transport component.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}
