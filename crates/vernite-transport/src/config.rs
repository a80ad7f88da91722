//! Transport configuration with validation.
//!
//! The endpoint is the only setting that matters in production; the buffer
//! capacities exist for tuning and tests.

use crate::{DEFAULT_INBOUND_CAPACITY, DEFAULT_ROUTE_CAPACITY};
use std::env;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Endpoint used when `VERNITE_WEBSOCKET_URL` is unset.
pub const DEFAULT_WEBSOCKET_URL: &str = "ws://localhost:8080/ws";

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Websocket endpoint (`ws://` or `wss://`).
    pub websocket_url: String,
    /// Buffered messages per demultiplexed route before slow readers lag.
    pub route_capacity: usize,
    /// Buffered raw frames between the connection and the demultiplexer.
    pub inbound_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            route_capacity: DEFAULT_ROUTE_CAPACITY,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
        }
    }
}

impl TransportConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `VERNITE_WEBSOCKET_URL`: Endpoint (default: ws://localhost:8080/ws)
    /// - `VERNITE_ROUTE_CAPACITY`: Per-route buffer (default: 256)
    /// - `VERNITE_INBOUND_CAPACITY`: Raw frame buffer (default: 1024)
    pub fn from_env() -> Self {
        Self {
            websocket_url: env::var("VERNITE_WEBSOCKET_URL")
                .unwrap_or_else(|_| DEFAULT_WEBSOCKET_URL.to_string()),

            route_capacity: parse_capacity(
                "VERNITE_ROUTE_CAPACITY",
                env::var("VERNITE_ROUTE_CAPACITY").ok().as_deref(),
                DEFAULT_ROUTE_CAPACITY,
            ),

            inbound_capacity: parse_capacity(
                "VERNITE_INBOUND_CAPACITY",
                env::var("VERNITE_INBOUND_CAPACITY").ok().as_deref(),
                DEFAULT_INBOUND_CAPACITY,
            ),
        }
    }

    /// Same configuration pointed at another endpoint.
    #[must_use]
    pub fn with_url(mut self, websocket_url: impl Into<String>) -> Self {
        self.websocket_url = websocket_url.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;

        if self.route_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "route_capacity cannot be 0".into(),
            ));
        }

        if self.inbound_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(
                "inbound_capacity cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Parsed endpoint; must be a `ws` or `wss` URL.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.websocket_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.websocket_url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

/// `raw` as a capacity, or `default` when unset or unparsable.
fn parse_capacity(var: &str, raw: Option<&str>, default: usize) -> usize {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(capacity) => capacity,
        Err(e) => {
            warn!(var, value = raw, error = %e, default, "Ignoring invalid capacity");
            default
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid websocket url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported url scheme {scheme}, expected ws or wss")]
    UnsupportedScheme { scheme: String },
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),
}
