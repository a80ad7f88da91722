//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a full `EnvFilter` directive)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to register the Prometheus collectors
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vernite-client".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: vernite-client)
    /// - `VERNITE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `VERNITE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `VERNITE_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `VERNITE_METRICS`: Register Prometheus collectors (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "vernite-client".to_string()),

            log_level: env::var("VERNITE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("VERNITE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("VERNITE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            metrics_enabled: env::var("VERNITE_METRICS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
