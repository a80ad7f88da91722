//! # Vernite Client
//!
//! Building blocks of the `vernite-client` binary: argument parsing, the
//! reconnect policy, and a watch session over one [`MessageTransport`].
//!
//! [`MessageTransport`]: vernite_transport::MessageTransport

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli;
pub mod reconnect;
pub mod session;

pub use cli::Args;
pub use reconnect::ReconnectPolicy;
pub use session::{run_session, watch_list, SessionEnd, SessionReport};
