//! Prometheus metrics for the realtime transport.
//!
//! All metrics follow the naming convention: `vernite_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., frames_sent_total)
//! - **Gauge**: Value that can go up or down (e.g., active routes)
//! - **Histogram**: Distribution of values (e.g., frame size)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHANNEL METRICS
    // =========================================================================

    /// Frames handed to the connection
    pub static ref FRAMES_SENT: Counter = Counter::new(
        "vernite_channel_frames_sent_total",
        "Total number of binary frames written to the websocket"
    ).expect("metric creation failed");

    /// Frames read from the connection
    pub static ref FRAMES_RECEIVED: Counter = Counter::new(
        "vernite_channel_frames_received_total",
        "Total number of binary frames read from the websocket"
    ).expect("metric creation failed");

    /// Inbound frame size
    pub static ref FRAME_SIZE: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "vernite_channel_frame_size_bytes",
            "Size of inbound frames"
        ).buckets(exponential_buckets(16.0, 4.0, 8).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Connection terminations by cause
    pub static ref CONNECTION_TERMINATIONS: CounterVec = CounterVec::new(
        Opts::new("vernite_channel_terminations_total", "Connection terminations"),
        &["cause"]  // cause: failed/closed
    ).expect("metric creation failed");

    // =========================================================================
    // DEMULTIPLEXER METRICS
    // =========================================================================

    /// Frames dropped before reaching any route
    pub static ref FRAMES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("vernite_demux_frames_dropped_total", "Inbound frames dropped"),
        &["reason"]  // reason: unknown_type/decode_failure/lagged
    ).expect("metric creation failed");

    /// Live demultiplexed routes
    pub static ref ACTIVE_ROUTES: Gauge = Gauge::new(
        "vernite_demux_active_routes",
        "Number of live (type, action) routes"
    ).expect("metric creation failed");

    /// Messages delivered to routes
    pub static ref MESSAGES_ROUTED: CounterVec = CounterVec::new(
        Opts::new("vernite_demux_messages_routed_total", "Messages delivered to routes"),
        &["type_name"]
    ).expect("metric creation failed");

    // =========================================================================
    // LIVENESS METRICS
    // =========================================================================

    /// Keep-alives echoed back to the server
    pub static ref KEEPALIVES_ECHOED: Counter = Counter::new(
        "vernite_liveness_keepalives_echoed_total",
        "Total keep-alive messages echoed"
    ).expect("metric creation failed");
}

/// Handle to the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all transport metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Channel
        Box::new(FRAMES_SENT.clone()),
        Box::new(FRAMES_RECEIVED.clone()),
        Box::new(FRAME_SIZE.clone()),
        Box::new(CONNECTION_TERMINATIONS.clone()),
        // Demultiplexer
        Box::new(FRAMES_DROPPED.clone()),
        Box::new(ACTIVE_ROUTES.clone()),
        Box::new(MESSAGES_ROUTED.clone()),
        // Liveness
        Box::new(KEEPALIVES_ECHOED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
