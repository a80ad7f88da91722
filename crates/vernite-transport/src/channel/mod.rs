//! # Transport Channel
//!
//! Owns exactly one physical connection. Outbound bytes go through a single
//! FIFO queue; inbound frames are fanned out raw to every attached receiver.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──inbound()──► Connecting ──► Open ──┬── peer error / drop ──► Terminated(ConnectionFailure)
//!   │                     │                 └── close()            ──► Terminated(ChannelClosed)
//!   └────── close() ──────┴──────────────────────────────────────────► Terminated(ChannelClosed)
//! ```
//!
//! There is no way back from `Terminated`.

pub mod memory;
pub mod websocket;

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::sink::Sink;
use futures::stream::BoxStream;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use vernite_telemetry::{CONNECTION_TERMINATIONS, FRAMES_RECEIVED, FRAMES_SENT, FRAME_SIZE};

/// Write half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<Bytes, Error = TransportError> + Send>>;

/// Read half of a connection. Ends (or yields an error) when the peer goes away.
pub type FrameStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// An established duplex byte-frame connection.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens the physical connection for a channel.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, TransportError>;

    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> String;
}

/// What a receiver attached via [`TransportChannel::inbound`] observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Frame(Bytes),
    /// Last event on the channel: `ConnectionFailure` or `ChannelClosed`.
    Terminated(TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
    Terminated(TransportError),
}

impl ChannelState {
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, ChannelState::Terminated(_))
    }

    #[must_use]
    pub fn terminal_cause(&self) -> Option<&TransportError> {
        match self {
            ChannelState::Terminated(cause) => Some(cause),
            _ => None,
        }
    }
}

/// Handle to the single connection. Cloning shares the same connection.
#[derive(Clone)]
pub struct TransportChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    connector: Arc<dyn Connector>,
    outbound_tx: mpsc::UnboundedSender<Bytes>,
    /// Present until the connection task takes it.
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Bytes>>>,
    inbound: broadcast::Sender<FrameEvent>,
    state: Arc<watch::Sender<ChannelState>>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportChannel {
    pub fn new(connector: Arc<dyn Connector>, inbound_capacity: usize) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound, _) = broadcast::channel(inbound_capacity.max(1));
        let (state, _) = watch::channel(ChannelState::Idle);
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(ChannelInner {
                connector,
                outbound_tx,
                outbound_rx: Mutex::new(Some(outbound_rx)),
                inbound,
                state: Arc::new(state),
                shutdown,
                task: Mutex::new(None),
            }),
        }
    }

    /// Queue one frame for sending.
    ///
    /// Frames queued before the connection is open are flushed in order once
    /// it is. Nothing confirms delivery.
    pub fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        if let Some(cause) = self.terminal_cause() {
            return Err(cause);
        }
        self.inner
            .outbound_tx
            .send(frame)
            .map_err(|_| self.terminal_cause().unwrap_or(TransportError::ChannelClosed))
    }

    /// Attach a receiver of raw inbound frames.
    ///
    /// The first call opens the connection. Each receiver sees only frames
    /// arriving after it was attached. Must be called inside a tokio runtime.
    pub fn inbound(&self) -> Result<broadcast::Receiver<FrameEvent>, TransportError> {
        // Subscribe before checking state: termination sets the state before
        // broadcasting, so a receiver can never miss the terminal event.
        let receiver = self.inner.inbound.subscribe();
        if let Some(cause) = self.terminal_cause() {
            return Err(cause);
        }
        self.ensure_started();
        Ok(receiver)
    }

    /// Close the connection. All receivers get `Terminated(ChannelClosed)`.
    pub fn close(&self) {
        let mut outbound_rx = self.inner.outbound_rx.lock();
        if outbound_rx.take().is_some() {
            // never connected
            terminate(
                &self.inner.state,
                &self.inner.inbound,
                TransportError::ChannelClosed,
            );
            return;
        }
        self.inner.shutdown.send_replace(true);
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.inner.state.borrow().clone()
    }

    /// Resolves with the terminal cause once the channel is terminated.
    pub async fn terminated(&self) -> TransportError {
        let mut state = self.inner.state.subscribe();
        let result = state
            .wait_for(ChannelState::is_terminated)
            .await
            .map(|state| state.terminal_cause().cloned());
        match result {
            Ok(Some(cause)) => cause,
            _ => TransportError::ChannelClosed,
        }
    }

    /// Number of raw frame receivers currently attached.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.inner.inbound.receiver_count()
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        self.inner.connector.endpoint()
    }

    fn terminal_cause(&self) -> Option<TransportError> {
        self.inner.state.borrow().terminal_cause().cloned()
    }

    fn ensure_started(&self) {
        let mut outbound_rx = self.inner.outbound_rx.lock();
        let Some(outbound) = outbound_rx.take() else {
            return;
        };

        debug!(endpoint = %self.endpoint(), "Starting connection task");
        let task = tokio::spawn(run_connection(
            Arc::clone(&self.inner.connector),
            outbound,
            self.inner.inbound.clone(),
            Arc::clone(&self.inner.state),
            self.inner.shutdown.subscribe(),
        ));
        *self.inner.task.lock() = Some(task);
    }
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("endpoint", &self.endpoint())
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for ChannelInner {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// Connection task: owns the socket for the channel's whole life.
async fn run_connection(
    connector: Arc<dyn Connector>,
    mut outbound: mpsc::UnboundedReceiver<Bytes>,
    inbound: broadcast::Sender<FrameEvent>,
    state: Arc<watch::Sender<ChannelState>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let endpoint = connector.endpoint();
    state.send_replace(ChannelState::Connecting);

    let connection = tokio::select! {
        result = connector.connect() => result,
        _ = shutdown.changed() => Err(TransportError::ChannelClosed),
    };
    let Connection {
        mut sink,
        mut stream,
    } = match connection {
        Ok(connection) => connection,
        Err(cause) => {
            terminate(&state, &inbound, cause);
            return;
        }
    };

    state.send_replace(ChannelState::Open);
    info!(endpoint = %endpoint, "Connection open");

    let cause = loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => {
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "Error while closing connection");
                }
                break TransportError::ChannelClosed;
            }

            Some(frame) = outbound.recv() => {
                let len = frame.len();
                if let Err(cause) = sink.send(frame).await {
                    break cause;
                }
                FRAMES_SENT.inc();
                debug!(bytes = len, "Frame sent");
            }

            next = stream.next() => match next {
                Some(Ok(frame)) => {
                    FRAMES_RECEIVED.inc();
                    FRAME_SIZE.observe(frame.len() as f64);
                    debug!(bytes = frame.len(), "Frame received");
                    // No receivers is fine: nothing is subscribed right now.
                    let _ = inbound.send(FrameEvent::Frame(frame));
                }
                Some(Err(cause)) => break cause,
                None => break TransportError::ConnectionFailure("connection closed by peer".into()),
            },
        }
    };

    terminate(&state, &inbound, cause);
}

fn terminate(
    state: &watch::Sender<ChannelState>,
    inbound: &broadcast::Sender<FrameEvent>,
    cause: TransportError,
) {
    if state.borrow().is_terminated() {
        return;
    }
    state.send_replace(ChannelState::Terminated(cause.clone()));

    match &cause {
        TransportError::ChannelClosed => {
            CONNECTION_TERMINATIONS.with_label_values(&["closed"]).inc();
            info!("Connection closed");
        }
        other => {
            CONNECTION_TERMINATIONS.with_label_values(&["failed"]).inc();
            error!(error = %other, "Connection failed");
        }
    }

    let _ = inbound.send(FrameEvent::Terminated(cause));
}
