//! # Error Types
//!
//! Runtime errors of the transport and the startup errors that prevent one
//! from being built.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced while moving messages through the transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Caller tried to send a type with no registry entry.
    #[error("Unregistered message type: {rust_type} has no entry in the type registry")]
    UnregisteredType { rust_type: String },

    /// Inbound envelope names a type this side does not know (version skew).
    #[error("Unknown message type on the wire: {type_name}")]
    UnknownType { type_name: String },

    /// Payload bytes do not parse as the named type.
    #[error("Failed to decode {type_name}: {reason}")]
    DecodeFailure { type_name: String, reason: String },

    /// Typed unpack found a different type in the envelope.
    #[error("Expected {expected}, envelope carries {actual}")]
    UnexpectedType { expected: String, actual: String },

    /// The connection dropped or could not be established.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// The channel was shut down locally.
    #[error("Channel closed")]
    ChannelClosed,
}

impl TransportError {
    /// Terminal errors end the channel and every stream attached to it.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailure(_) | TransportError::ChannelClosed
        )
    }

    /// Decode-time errors only cost the one frame.
    #[must_use]
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            TransportError::UnknownType { .. } | TransportError::DecodeFailure { .. }
        )
    }
}

/// Namespace configuration errors, detected when the registry is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two definitions produce the same dotted name.
    #[error("Duplicate type name in schema namespace: {name}")]
    DuplicateName { name: String },

    /// One Rust type is declared under two dotted names.
    #[error("Type {rust_type} registered twice: as {first} and as {second}")]
    DuplicateType {
        rust_type: String,
        first: String,
        second: String,
    },

    /// The namespace declares no message types.
    #[error("Schema namespace {root} contains no message types")]
    Empty { root: String },
}

/// Anything that stops a transport from being built.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
