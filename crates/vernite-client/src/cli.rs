//! Command-line arguments.

use clap::Parser;
use vernite_schema::BasicAction;
use vernite_telemetry::TelemetryConfig;
use vernite_transport::TransportConfig;

use crate::reconnect::MAX_RECONNECT_ATTEMPTS;

/// Vernite realtime channel client
#[derive(Parser, Debug, Clone)]
#[command(name = "vernite-client")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// WebSocket endpoint URL (overrides VERNITE_WEBSOCKET_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Dotted message type to log, e.g. vernite.Task (repeatable; default: all)
    #[arg(long = "watch", value_name = "TYPE")]
    pub watch: Vec<String>,

    /// Only log messages carrying this action
    #[arg(long, value_parser = parse_action)]
    pub action: Option<BasicAction>,

    /// Reconnect attempts before giving up
    #[arg(long, default_value_t = MAX_RECONNECT_ATTEMPTS)]
    pub max_retries: u32,

    /// Log level or EnvFilter directive (overrides VERNITE_LOG_LEVEL)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Environment configuration with command-line overrides applied.
    pub fn transport_config(&self) -> TransportConfig {
        let config = TransportConfig::from_env();
        match &self.url {
            Some(url) => config.with_url(url.clone()),
            None => config,
        }
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        let mut config = TelemetryConfig::from_env();
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.json_logs {
            config.json_logs = true;
        }
        config
    }
}

/// Parses `added`, `updated` or `removed` (any case).
pub fn parse_action(value: &str) -> Result<BasicAction, String> {
    match BasicAction::from_str_name(value) {
        Some(BasicAction::Unspecified) | None => Err(format!(
            "unknown action '{value}', expected added, updated or removed"
        )),
        Some(action) => Ok(action),
    }
}
