//! # Vernite Transport
//!
//! One multiplexed websocket carrying protobuf messages wrapped in
//! `google.protobuf.Any` envelopes, with per-type subscriptions on top.
//!
//! ## Architecture
//!
//! ```text
//!  next(&msg) ──► EnvelopeCodec::pack ──► TransportChannel::send ──► socket
//!
//!  socket ──► TransportChannel::inbound ──► Demultiplexer pump
//!                                             │ EnvelopeCodec::unpack (once)
//!                                             ├─► route (Task, None)    ──► MessageStream<Task>
//!                                             ├─► route (Task, Added)   ──► MessageStream<Task>
//!                                             └─► route (KeepAlive)     ──► LivenessDriver (echo)
//! ```
//!
//! The channel is fail-stop: when the connection drops, every stream receives
//! [`TransportError::ConnectionFailure`] and the transport is finished.
//! Reconnecting means building a new [`MessageTransport`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vernite_schema::{BasicAction, Task};
//! use vernite_transport::{MessageTransport, TransportConfig};
//!
//! let transport = MessageTransport::connect(TransportConfig::from_env())?;
//! let mut added = transport.subscribe::<Task>(Some(BasicAction::Added))?;
//! while let Ok(task) = added.recv().await {
//!     println!("new task {}", task.name);
//! }
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod codec;
pub mod config;
pub mod demux;
pub mod error;
pub mod liveness;
pub mod registry;
pub mod service;

pub use channel::{
    memory::{MemoryConnector, MemoryPeer},
    websocket::WebSocketConnector,
    ChannelState, Connection, Connector, FrameEvent, TransportChannel,
};
pub use codec::EnvelopeCodec;
pub use config::{ConfigError, TransportConfig, DEFAULT_WEBSOCKET_URL};
pub use demux::{Delivery, Demultiplexer, MessageStream, RouteKey, Subscription};
pub use error::{RegistryError, SetupError, TransportError};
pub use liveness::LivenessDriver;
pub use registry::TypeRegistry;
pub use service::MessageTransport;

/// Default buffered messages per route.
pub const DEFAULT_ROUTE_CAPACITY: usize = 256;

/// Default buffered raw frames between the connection and the pump.
pub const DEFAULT_INBOUND_CAPACITY: usize = 1024;
