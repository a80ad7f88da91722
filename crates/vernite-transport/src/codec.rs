//! # Envelope Codec
//!
//! Every frame on the wire is a `google.protobuf.Any`:
//!
//! ```text
//! Any {
//!     type_url: "vernite.Task",        // dotted name from the registry
//!     value:    <Task encoded bytes>,
//! }
//! ```
//!
//! The codec is pure: no I/O, no logging. Callers decide what a failed decode
//! costs.

use crate::error::TransportError;
use crate::registry::TypeRegistry;
use bytes::Bytes;
use prost::Message;
use prost_types::Any;
use std::sync::Arc;
use vernite_schema::{DynMessage, VerniteMessage};

const ANY_TYPE_NAME: &str = "google.protobuf.Any";

/// Packs and unpacks typed messages in `Any` envelopes.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    registry: Arc<TypeRegistry>,
}

impl EnvelopeCodec {
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Encode `message` as one wire frame.
    pub fn pack<T: VerniteMessage>(&self, message: &T) -> Result<Bytes, TransportError> {
        self.pack_dyn(message)
    }

    /// [`pack`](Self::pack) for a message whose type is only known at runtime.
    pub fn pack_dyn(&self, message: &dyn DynMessage) -> Result<Bytes, TransportError> {
        let type_name = self
            .registry
            .resolve_name(message.message_type_id())
            .map_err(|_| TransportError::UnregisteredType {
                rust_type: message.rust_type_name().to_string(),
            })?;

        let envelope = Any {
            type_url: type_name.to_string(),
            value: message.encode_payload(),
        };
        Ok(Bytes::from(envelope.encode_to_vec()))
    }

    /// Decode one wire frame into its concrete message.
    pub fn unpack(&self, frame: &[u8]) -> Result<Box<dyn DynMessage>, TransportError> {
        let envelope = Self::open(frame)?;
        let type_name = type_name_of(&envelope.type_url);
        let decode = self.registry.resolve_decoder(type_name)?;

        decode(&envelope.value).map_err(|e| TransportError::DecodeFailure {
            type_name: type_name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode one wire frame that must carry a `T`.
    pub fn unpack_as<T: VerniteMessage>(&self, frame: &[u8]) -> Result<T, TransportError> {
        let message = self.unpack(frame)?;
        if let Some(typed) = message.downcast_ref::<T>() {
            return Ok(typed.clone());
        }

        let expected = self.registry.resolve_name_of::<T>()?.to_string();
        let actual = self
            .registry
            .resolve_name(message.message_type_id())
            .map(str::to_string)
            .unwrap_or_else(|_| message.rust_type_name().to_string());
        Err(TransportError::UnexpectedType { expected, actual })
    }

    /// Wire name carried by a frame, without decoding the payload.
    pub fn peek_type_name(frame: &[u8]) -> Result<String, TransportError> {
        let envelope = Self::open(frame)?;
        Ok(type_name_of(&envelope.type_url).to_string())
    }

    fn open(frame: &[u8]) -> Result<Any, TransportError> {
        Any::decode(frame).map_err(|e| TransportError::DecodeFailure {
            type_name: ANY_TYPE_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Strips a `type.googleapis.com/`-style prefix if a peer sends one.
fn type_name_of(type_url: &str) -> &str {
    type_url
        .rsplit_once('/')
        .map_or(type_url, |(_, name)| name)
}
