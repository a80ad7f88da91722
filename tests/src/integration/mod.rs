//! # Integration Scenarios
//!
//! Every scenario drives a real [`MessageTransport`] whose connection is a
//! [`MemoryPeer`] playing the server.
//!
//! [`MessageTransport`]: vernite_transport::MessageTransport
//! [`MemoryPeer`]: vernite_transport::MemoryPeer

#[cfg(test)]
pub mod fixtures;

pub mod lifecycle;
pub mod liveness;
pub mod resilience;
pub mod routing;
