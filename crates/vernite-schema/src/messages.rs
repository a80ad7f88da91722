//! # Vernite Messages
//!
//! Message definitions of the `vernite` protobuf package. Nested types live in
//! snake_case modules named after their parent, matching prost's layout.

use crate::message::vernite_message;

// =============================================================================
// LIVENESS
// =============================================================================

/// Keep-alive ping. The server sends it periodically; clients echo it back.
#[derive(Clone, PartialEq, prost::Message)]
pub struct KeepAlive {}

// =============================================================================
// DISCRIMINATOR
// =============================================================================

/// What happened to the entity carried by a change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum BasicAction {
    Unspecified = 0,
    Added = 1,
    Updated = 2,
    Removed = 3,
}

impl BasicAction {
    /// Protobuf name of the variant.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            BasicAction::Unspecified => "UNSPECIFIED",
            BasicAction::Added => "ADDED",
            BasicAction::Updated => "UPDATED",
            BasicAction::Removed => "REMOVED",
        }
    }

    /// Parses a protobuf variant name, case-insensitively.
    pub fn from_str_name(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "UNSPECIFIED" => Some(Self::Unspecified),
            "ADDED" => Some(Self::Added),
            "UPDATED" => Some(Self::Updated),
            "REMOVED" => Some(Self::Removed),
            _ => None,
        }
    }
}

// =============================================================================
// PROJECT BOARD
// =============================================================================

/// A project workspace entry.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Project {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub description: String,
    #[prost(enumeration = "BasicAction", optional, tag = "4")]
    pub action: Option<i32>,
}

/// A task on a project board.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Task {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub project_id: i64,
    #[prost(int64, tag = "3")]
    pub status_id: i64,
    #[prost(string, tag = "4")]
    pub name: String,
    #[prost(string, tag = "5")]
    pub description: String,
    /// Unix millis.
    #[prost(int64, optional, tag = "6")]
    pub deadline: Option<i64>,
    #[prost(enumeration = "BasicAction", optional, tag = "7")]
    pub action: Option<i32>,
}

/// A board column.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Status {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub project_id: i64,
    #[prost(string, tag = "3")]
    pub name: String,
    /// RGB packed into the low 24 bits.
    #[prost(uint32, tag = "4")]
    pub color: u32,
    #[prost(bool, tag = "5")]
    pub is_final: bool,
    #[prost(int32, tag = "6")]
    pub ordinal: i32,
    #[prost(enumeration = "BasicAction", optional, tag = "7")]
    pub action: Option<i32>,
}

/// A sprint of a project.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Sprint {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub project_id: i64,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(int64, tag = "4")]
    pub start_date: i64,
    #[prost(int64, tag = "5")]
    pub finish_date: i64,
    #[prost(enumeration = "sprint::Status", tag = "6")]
    pub status: i32,
    #[prost(enumeration = "BasicAction", optional, tag = "7")]
    pub action: Option<i32>,
}

/// Nested types of [`Sprint`].
pub mod sprint {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Status {
        Created = 0,
        Active = 1,
        Closed = 2,
    }
}

// =============================================================================
// COMMUNICATOR (chat integrations)
// =============================================================================

/// Container for the communicator integration messages.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CommunicatorModel {}

/// Nested types of [`CommunicatorModel`].
pub mod communicator_model {
    /// A chat message relayed from an integrated provider.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Message {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub channel: String,
        #[prost(string, tag = "3")]
        pub user: String,
        #[prost(string, tag = "4")]
        pub content: String,
        /// Unix seconds.
        #[prost(int64, tag = "5")]
        pub timestamp: i64,
        #[prost(string, tag = "6")]
        pub provider: String,
        #[prost(enumeration = "super::BasicAction", optional, tag = "7")]
        pub action: Option<i32>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Channel {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub provider: String,
        #[prost(enumeration = "super::BasicAction", optional, tag = "4")]
        pub action: Option<i32>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct User {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(string, tag = "2")]
        pub name: String,
        #[prost(string, tag = "3")]
        pub display_name: String,
        #[prost(string, tag = "4")]
        pub avatar: String,
        #[prost(string, tag = "5")]
        pub provider: String,
    }
}

vernite_message!(KeepAlive);
vernite_message!(Project, action);
vernite_message!(Task, action);
vernite_message!(Status, action);
vernite_message!(Sprint, action);
vernite_message!(CommunicatorModel);
vernite_message!(communicator_model::Message, action);
vernite_message!(communicator_model::Channel, action);
vernite_message!(communicator_model::User);
