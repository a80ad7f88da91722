//! # Vernite Telemetry
//!
//! Logging and metrics for the Vernite realtime transport.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, human or JSON output
//! - **Metrics**: Prometheus counters and gauges for the channel, the
//!   demultiplexer and the liveness driver
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vernite_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//!
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `vernite-client` | Service name in logs |
//! | `VERNITE_LOG_LEVEL` | `info` | Log level filter |
//! | `VERNITE_JSON_LOGS` | `false` | JSON log lines |
//! | `VERNITE_METRICS` | `true` | Register Prometheus collectors |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ACTIVE_ROUTES, CONNECTION_TERMINATIONS,
    FRAMES_DROPPED, FRAMES_RECEIVED, FRAMES_SENT, FRAME_SIZE, KEEPALIVES_ECHOED,
    MESSAGES_ROUTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so collectors exist before the first log line mentions them
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        metrics = config.metrics_enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
