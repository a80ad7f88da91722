//! In-process connection.
//!
//! [`MemoryConnector::pair`] returns the connector handed to a channel and the
//! [`MemoryPeer`] playing the server: it injects inbound frames, reads what the
//! channel sends, and can fail or drop the connection.

use super::{Connection, Connector};
use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

type PeerFrame = Result<Bytes, TransportError>;

/// Connector for a single in-memory connection.
pub struct MemoryConnector {
    link: Mutex<Option<MemoryLink>>,
    refusal: Option<String>,
}

struct MemoryLink {
    inbound: mpsc::UnboundedReceiver<PeerFrame>,
    outbound: mpsc::UnboundedSender<Bytes>,
}

/// Server side of a [`MemoryConnector`].
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<PeerFrame>>,
    outbound: mpsc::UnboundedReceiver<Bytes>,
}

impl MemoryConnector {
    #[must_use]
    pub fn pair() -> (Self, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let connector = Self {
            link: Mutex::new(Some(MemoryLink {
                inbound: inbound_rx,
                outbound: outbound_tx,
            })),
            refusal: None,
        };
        let peer = MemoryPeer {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
        };
        (connector, peer)
    }

    /// A connector whose `connect` always fails with `reason`.
    #[must_use]
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            link: Mutex::new(None),
            refusal: Some(reason.into()),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        if let Some(reason) = &self.refusal {
            return Err(TransportError::ConnectionFailure(reason.clone()));
        }

        let MemoryLink { inbound, outbound } = self.link.lock().take().ok_or_else(|| {
            TransportError::ConnectionFailure("memory connection already used".into())
        })?;

        let sink = futures::sink::unfold(outbound, |outbound, frame: Bytes| async move {
            outbound
                .send(frame)
                .map_err(|_| TransportError::ConnectionFailure("memory peer dropped".into()))?;
            Ok::<_, TransportError>(outbound)
        });

        Ok(Connection {
            sink: Box::pin(sink),
            stream: UnboundedReceiverStream::new(inbound).boxed(),
        })
    }

    fn endpoint(&self) -> String {
        "memory://peer".to_string()
    }
}

impl MemoryPeer {
    /// Deliver one inbound frame. Returns `false` once the connection is gone.
    pub fn push_frame(&self, frame: impl Into<Bytes>) -> bool {
        self.inbound
            .as_ref()
            .map_or(false, |tx| tx.send(Ok(frame.into())).is_ok())
    }

    /// Fail the connection with `reason`.
    pub fn fail(&self, reason: impl Into<String>) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(Err(TransportError::ConnectionFailure(reason.into())));
        }
    }

    /// Hang up without an error; the channel sees the stream end.
    pub fn close(&mut self) {
        self.inbound = None;
    }

    /// Next frame the channel sent, `None` once the channel is gone.
    pub async fn recv_outbound(&mut self) -> Option<Bytes> {
        self.outbound.recv().await
    }

    pub fn try_recv_outbound(&mut self) -> Option<Bytes> {
        self.outbound.try_recv().ok()
    }
}
