//! # Vernite Schema Crate
//!
//! This crate contains the `vernite` protobuf message catalog consumed by the
//! realtime transport, and the static namespace tree describing it.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every wire type name is derived from the
//!   [`namespace`] tree, never from Rust type names.
//! - **No reflection**: The tree is declared statically; each message node
//!   carries a fn-pointer decoder and its `TypeId`.
//! - **Opaque payloads**: Transport code only sees [`DynMessage`]; encoding and
//!   decoding are delegated to `prost`.
//!
//! ## Layout
//!
//! ```text
//! vernite                       (package)
//! ├── KeepAlive
//! ├── BasicAction               (enum, not a message)
//! ├── Project
//! ├── Task
//! ├── Status
//! ├── Sprint
//! │   └── Status                (enum)
//! └── CommunicatorModel
//!     ├── Message
//!     ├── Channel
//!     └── User
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod message;
pub mod messages;
pub mod namespace;

pub use message::{DynMessage, VerniteMessage};
pub use messages::*;
pub use namespace::{namespace, DecodeFn, MessageDescriptor, SchemaNode};

/// Root package of the catalog; every dotted wire name starts with it.
pub const ROOT_PACKAGE: &str = "vernite";
