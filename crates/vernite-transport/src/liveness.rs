//! Keep-alive echo.
//!
//! The server sends `vernite.KeepAlive` periodically and expects each one back.
//! The driver subscribes once, echoes every keep-alive it sees, and stops for
//! good when the channel terminates.

use crate::demux::Demultiplexer;
use crate::error::TransportError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use vernite_schema::KeepAlive;
use vernite_telemetry::{log_event, KEEPALIVES_ECHOED};

/// Background task echoing keep-alives.
#[derive(Debug)]
pub struct LivenessDriver {
    task: JoinHandle<()>,
    echoed: Arc<AtomicU64>,
}

impl LivenessDriver {
    /// Subscribe to keep-alives and start echoing. Must run inside a tokio
    /// runtime.
    pub fn start(demux: Demultiplexer) -> Result<Self, TransportError> {
        let mut keepalives = demux.subscribe::<KeepAlive>(None)?;
        let echoed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&echoed);

        let task = tokio::spawn(async move {
            log_event!(debug, "liveness", "Liveness driver started");
            loop {
                let keepalive = match keepalives.recv().await {
                    Ok(keepalive) => keepalive,
                    Err(cause) => {
                        log_event!(info, "liveness", "Liveness driver stopped", cause = %cause);
                        return;
                    }
                };

                if let Err(e) = demux.publish(keepalive.as_ref()) {
                    log_event!(warn, "liveness", "Keep-alive echo failed", error = %e);
                    return;
                }
                let total = counter.fetch_add(1, Ordering::Relaxed) + 1;
                KEEPALIVES_ECHOED.inc();
                debug!(total, "Keep-alive echoed");
            }
        });

        Ok(Self { task, echoed })
    }

    /// Keep-alives echoed so far.
    #[must_use]
    pub fn echoed(&self) -> u64 {
        self.echoed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for LivenessDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
