//! # Vernite Transport Test Suite
//!
//! Cross-crate scenarios run against a full [`MessageTransport`] over an
//! in-memory connection.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── codec_benchmarks.rs   # pack/unpack and fan-out throughput
//! └── src/integration/
//!     ├── fixtures.rs           # Harness: transport + scripted peer
//!     ├── resilience.rs         # Unknown and malformed inbound frames
//!     ├── routing.rs            # Type/action filtering, shared routes, teardown
//!     ├── liveness.rs           # Keep-alive echo
//!     └── lifecycle.rs          # Outbound order, failure, shutdown
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p vernite-tests
//! cargo test -p vernite-tests integration::routing::
//! cargo bench -p vernite-tests
//! ```
//!
//! [`MessageTransport`]: vernite_transport::MessageTransport

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
