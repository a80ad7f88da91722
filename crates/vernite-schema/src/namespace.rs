//! # Schema Namespace
//!
//! Static tree describing the `vernite` package. Message nodes carry a
//! [`MessageDescriptor`] (decoder plus type identity); package and enum nodes
//! only structure the tree.
//!
//! Adding a message to the catalog means adding a node here. The type registry
//! derives every dotted wire name from this tree and rejects duplicates at
//! startup.

use crate::message::{DynMessage, VerniteMessage};
use crate::messages::{communicator_model, CommunicatorModel, KeepAlive, Project, Sprint, Status, Task};
use std::any::TypeId;
use std::fmt;

/// Decodes a payload into a boxed message of a fixed concrete type.
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn DynMessage>, prost::DecodeError>;

/// Everything the registry needs to know about one concrete message type.
#[derive(Clone, Copy)]
pub struct MessageDescriptor {
    type_id: fn() -> TypeId,
    rust_name: fn() -> &'static str,
    decode: DecodeFn,
    has_action: bool,
}

impl MessageDescriptor {
    /// Descriptor for `T`.
    pub const fn of<T: VerniteMessage>() -> Self {
        Self {
            type_id: TypeId::of::<T>,
            rust_name: std::any::type_name::<T>,
            decode: decode_boxed::<T>,
            has_action: T::HAS_ACTION,
        }
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    #[must_use]
    pub fn rust_name(&self) -> &'static str {
        (self.rust_name)()
    }

    /// Whether messages of this type can be filtered by action.
    #[must_use]
    pub fn has_action(&self) -> bool {
        self.has_action
    }

    #[must_use]
    pub fn decoder(&self) -> DecodeFn {
        self.decode
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Box<dyn DynMessage>, prost::DecodeError> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("rust_name", &self.rust_name())
            .finish()
    }
}

fn decode_boxed<T: VerniteMessage>(bytes: &[u8]) -> Result<Box<dyn DynMessage>, prost::DecodeError> {
    Ok(Box::new(T::decode(bytes)?))
}

/// A node of the namespace tree.
#[derive(Debug, Clone, Copy)]
pub enum SchemaNode {
    /// Sub-namespace. Its name extends the dotted prefix; it is not a type.
    Package {
        name: &'static str,
        children: &'static [SchemaNode],
    },
    /// Concrete message type, possibly with nested definitions.
    Message {
        name: &'static str,
        descriptor: MessageDescriptor,
        nested: &'static [SchemaNode],
    },
    /// Enumeration. Not a message; never registered.
    Enum { name: &'static str },
}

impl SchemaNode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SchemaNode::Package { name, .. }
            | SchemaNode::Message { name, .. }
            | SchemaNode::Enum { name } => name,
        }
    }

    /// Child nodes, empty for enums.
    #[must_use]
    pub fn children(&self) -> &'static [SchemaNode] {
        match self {
            SchemaNode::Package { children, .. } => children,
            SchemaNode::Message { nested, .. } => nested,
            SchemaNode::Enum { .. } => &[],
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> Option<&MessageDescriptor> {
        match self {
            SchemaNode::Message { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

static SPRINT_NESTED: [SchemaNode; 1] = [SchemaNode::Enum { name: "Status" }];

static COMMUNICATOR_MODEL_NESTED: [SchemaNode; 3] = [
    SchemaNode::Message {
        name: "Message",
        descriptor: MessageDescriptor::of::<communicator_model::Message>(),
        nested: &[],
    },
    SchemaNode::Message {
        name: "Channel",
        descriptor: MessageDescriptor::of::<communicator_model::Channel>(),
        nested: &[],
    },
    SchemaNode::Message {
        name: "User",
        descriptor: MessageDescriptor::of::<communicator_model::User>(),
        nested: &[],
    },
];

static VERNITE_CHILDREN: [SchemaNode; 7] = [
    SchemaNode::Message {
        name: "KeepAlive",
        descriptor: MessageDescriptor::of::<KeepAlive>(),
        nested: &[],
    },
    SchemaNode::Enum {
        name: "BasicAction",
    },
    SchemaNode::Message {
        name: "Project",
        descriptor: MessageDescriptor::of::<Project>(),
        nested: &[],
    },
    SchemaNode::Message {
        name: "Task",
        descriptor: MessageDescriptor::of::<Task>(),
        nested: &[],
    },
    SchemaNode::Message {
        name: "Status",
        descriptor: MessageDescriptor::of::<Status>(),
        nested: &[],
    },
    SchemaNode::Message {
        name: "Sprint",
        descriptor: MessageDescriptor::of::<Sprint>(),
        nested: &SPRINT_NESTED,
    },
    SchemaNode::Message {
        name: "CommunicatorModel",
        descriptor: MessageDescriptor::of::<CommunicatorModel>(),
        nested: &COMMUNICATOR_MODEL_NESTED,
    },
];

static VERNITE: SchemaNode = SchemaNode::Package {
    name: crate::ROOT_PACKAGE,
    children: &VERNITE_CHILDREN,
};

/// Root of the `vernite` namespace.
#[must_use]
pub fn namespace() -> &'static SchemaNode {
    &VERNITE
}
