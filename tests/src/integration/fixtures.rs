//! Shared test fixtures.

use bytes::Bytes;
use prost::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use vernite_schema::{BasicAction, Project, Task, VerniteMessage};
use vernite_transport::{
    EnvelopeCodec, MemoryConnector, MemoryPeer, MessageStream, MessageTransport, Subscription,
    TransportConfig,
};

/// Upper bound for anything a scenario waits on.
pub const WAIT: Duration = Duration::from_secs(2);

/// A transport wired to a scripted server.
pub struct Harness {
    pub transport: MessageTransport,
    pub peer: MemoryPeer,
    pub codec: EnvelopeCodec,
}

impl Harness {
    /// Must be called inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Self {
        let (connector, peer) = MemoryConnector::pair();
        let transport = MessageTransport::with_connector(config, Arc::new(connector))
            .expect("transport setup");
        let codec = transport.codec().clone();
        Self {
            transport,
            peer,
            codec,
        }
    }

    /// Server sends `message`.
    pub fn push<T: VerniteMessage>(&self, message: &T) {
        let frame = self.codec.pack(message).expect("pack");
        assert!(self.peer.push_frame(frame), "peer connection gone");
    }

    /// Server sends raw bytes.
    pub fn push_raw(&self, frame: impl Into<Bytes>) {
        assert!(self.peer.push_frame(frame), "peer connection gone");
    }

    /// Next frame the client sent.
    pub async fn next_outbound(&mut self) -> Bytes {
        timeout(WAIT, self.peer.recv_outbound())
            .await
            .expect("timed out waiting for outbound frame")
            .expect("channel gone")
    }

    /// Round-trips a keep-alive. Once its echo is back, every frame pushed
    /// earlier has been through the demultiplexer.
    pub async fn sync(&mut self) {
        self.push(&vernite_schema::KeepAlive {});
        let echo = self.next_outbound().await;
        assert!(self
            .codec
            .unpack_as::<vernite_schema::KeepAlive>(&echo)
            .is_ok());
    }
}

/// Envelope naming a type nobody registered.
pub fn unknown_type_frame(type_url: &str) -> Bytes {
    Bytes::from(
        prost_types::Any {
            type_url: type_url.to_string(),
            value: vec![0x08, 0x01],
        }
        .encode_to_vec(),
    )
}

pub fn task(id: i64, action: Option<BasicAction>) -> Task {
    Task {
        id,
        project_id: 1,
        name: format!("task-{id}"),
        action: action.map(|a| a as i32),
        ..Default::default()
    }
}

pub fn project(id: i64, action: Option<BasicAction>) -> Project {
    Project {
        id,
        name: format!("project-{id}"),
        action: action.map(|a| a as i32),
        ..Default::default()
    }
}

pub async fn recv<T: VerniteMessage>(stream: &mut MessageStream<T>) -> Arc<T> {
    timeout(WAIT, stream.recv())
        .await
        .expect("timed out waiting for message")
        .expect("stream terminated")
}

pub async fn recv_named(subscription: &mut Subscription) -> Arc<dyn vernite_schema::DynMessage> {
    timeout(WAIT, subscription.recv())
        .await
        .expect("timed out waiting for message")
        .expect("stream terminated")
}
