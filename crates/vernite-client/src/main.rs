//! # Vernite Client
//!
//! Connects to the Vernite realtime channel and logs every message of the
//! watched types.
//!
//! ## Usage
//!
//! ```bash
//! # Everything, against the default endpoint
//! vernite-client
//!
//! # Only newly added tasks, from a remote server
//! vernite-client --url wss://vernite.dev/api/ws --watch vernite.Task --action added
//! ```
//!
//! The transport itself is fail-stop. When the connection drops the client
//! builds a new transport after an exponential backoff delay, up to
//! `--max-retries` times.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use vernite_client::{run_session, watch_list, Args, ReconnectPolicy, SessionEnd};
use vernite_telemetry::init_telemetry;
use vernite_transport::{MessageTransport, TypeRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry =
        init_telemetry(args.telemetry_config()).context("Failed to initialize telemetry")?;

    let config = args.transport_config();
    config
        .validate()
        .context("Invalid transport configuration")?;

    let registry = TypeRegistry::vernite().context("Failed to build type registry")?;
    let watch = watch_list(&registry, &args.watch)?;
    let policy = ReconnectPolicy::with_max_attempts(args.max_retries);

    info!(
        url = %config.websocket_url,
        watch = ?watch,
        action = ?args.action,
        "Starting vernite-client"
    );

    let mut attempt = 0u32;
    loop {
        let transport =
            MessageTransport::connect(config.clone()).context("Failed to start transport")?;

        let report = run_session(transport, &watch, args.action, shutdown_signal()).await?;
        let cause = match report.end {
            SessionEnd::Interrupted => {
                info!(received = report.received, "Interrupted, exiting");
                return Ok(());
            }
            SessionEnd::Terminated(cause) => cause,
        };

        // A session that delivered messages was a working connection.
        if report.received > 0 {
            attempt = 0;
        }
        attempt += 1;

        if !policy.should_retry(attempt) {
            error!(attempts = attempt - 1, "Giving up on reconnecting");
            bail!("connection lost after {} reconnect attempts: {cause}", attempt - 1);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            error = %cause,
            attempt,
            max_attempts = policy.max_attempts,
            delay_secs = delay.as_secs(),
            "Connection lost, reconnecting"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_signal() => {
                info!("Interrupted while waiting to reconnect, exiting");
                return Ok(());
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
