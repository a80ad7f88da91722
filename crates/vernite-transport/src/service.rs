//! # Message Transport
//!
//! Owns the whole stack for one connection: registry, codec, channel,
//! demultiplexer and liveness driver. This is what applications hold.

use crate::channel::websocket::WebSocketConnector;
use crate::channel::{ChannelState, Connector, TransportChannel};
use crate::codec::EnvelopeCodec;
use crate::config::TransportConfig;
use crate::demux::{Demultiplexer, MessageStream, Subscription};
use crate::error::{SetupError, TransportError};
use crate::liveness::LivenessDriver;
use crate::registry::TypeRegistry;
use std::sync::Arc;
use tracing::info;
use vernite_schema::{BasicAction, DynMessage, VerniteMessage};

/// The consumer-facing transport.
#[derive(Debug)]
pub struct MessageTransport {
    config: TransportConfig,
    registry: Arc<TypeRegistry>,
    demux: Demultiplexer,
    liveness: LivenessDriver,
}

impl MessageTransport {
    /// Transport over a websocket to `config.websocket_url`.
    ///
    /// Must be called inside a tokio runtime. The socket is opened right away
    /// because the liveness driver subscribes during construction.
    pub fn connect(config: TransportConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let connector = WebSocketConnector::new(config.endpoint()?);
        Self::with_connector(config, Arc::new(connector))
    }

    /// Transport over any [`Connector`].
    pub fn with_connector(
        config: TransportConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, SetupError> {
        config.validate()?;

        let registry = Arc::new(TypeRegistry::vernite()?);
        let codec = EnvelopeCodec::new(Arc::clone(&registry));
        let channel = TransportChannel::new(connector, config.inbound_capacity);
        let demux = Demultiplexer::new(channel, codec, config.route_capacity);
        let liveness = LivenessDriver::start(demux.clone())?;

        info!(
            endpoint = %demux.channel().endpoint(),
            types = registry.len(),
            "Message transport started"
        );

        Ok(Self {
            config,
            registry,
            demux,
            liveness,
        })
    }

    /// Stream of `T` messages, optionally only those with `action`.
    pub fn subscribe<T: VerniteMessage>(
        &self,
        action: Option<BasicAction>,
    ) -> Result<MessageStream<T>, TransportError> {
        self.demux.subscribe(action)
    }

    /// Untyped stream of the type registered as `type_name`.
    pub fn subscribe_named(
        &self,
        type_name: &str,
        action: Option<BasicAction>,
    ) -> Result<Subscription, TransportError> {
        self.demux.subscribe_named(type_name, action)
    }

    /// Send one message. Fire-and-forget.
    pub fn next<T: VerniteMessage>(&self, message: &T) -> Result<(), TransportError> {
        self.demux.publish(message)
    }

    pub fn next_dyn(&self, message: &dyn DynMessage) -> Result<(), TransportError> {
        self.demux.publish_dyn(message)
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn codec(&self) -> &EnvelopeCodec {
        self.demux.codec()
    }

    #[must_use]
    pub fn demultiplexer(&self) -> &Demultiplexer {
        &self.demux
    }

    #[must_use]
    pub fn liveness(&self) -> &LivenessDriver {
        &self.liveness
    }

    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    #[must_use]
    pub fn channel_state(&self) -> ChannelState {
        self.demux.channel().state()
    }

    /// Resolves with the reason once the connection has ended.
    pub async fn terminated(&self) -> TransportError {
        self.demux.channel().terminated().await
    }

    /// Close the connection; every open stream ends with `ChannelClosed`.
    pub fn shutdown(&self) {
        info!("Shutting down message transport");
        self.demux.channel().close();
    }
}
