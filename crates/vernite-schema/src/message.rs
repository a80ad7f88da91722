//! # Message Traits
//!
//! [`VerniteMessage`] is implemented by every concrete catalog type.
//! [`DynMessage`] is its object-safe face, used wherever the concrete type is
//! only known at runtime (decoded inbound frames, untyped subscriptions).

use crate::messages::BasicAction;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A concrete message of the `vernite` catalog.
pub trait VerniteMessage:
    prost::Message + Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Whether the type has an `action` field at all.
    const HAS_ACTION: bool = false;

    /// The sub-routing discriminator, for messages that carry one.
    fn action(&self) -> Option<BasicAction> {
        None
    }
}

/// Object-safe view of a [`VerniteMessage`].
pub trait DynMessage: Any + fmt::Debug + Send + Sync {
    /// Binary protobuf encoding of the message body.
    fn encode_payload(&self) -> Vec<u8>;

    /// See [`VerniteMessage::action`].
    fn action(&self) -> Option<BasicAction>;

    /// `TypeId` of the concrete message type.
    ///
    /// Named apart from `Any::type_id` so calls through `Box`/`Arc` cannot
    /// resolve to the smart pointer's own id.
    fn message_type_id(&self) -> TypeId;

    /// Rust path of the concrete type, for diagnostics.
    fn rust_type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn clone_boxed(&self) -> Box<dyn DynMessage>;

    /// Field-for-field equality across the object boundary.
    fn eq_dyn(&self, other: &dyn DynMessage) -> bool;
}

impl<T: VerniteMessage> DynMessage for T {
    fn encode_payload(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    fn action(&self) -> Option<BasicAction> {
        VerniteMessage::action(self)
    }

    fn message_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn rust_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynMessage> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynMessage) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }
}

impl dyn DynMessage {
    /// Borrow as a concrete type if it is one.
    pub fn downcast_ref<T: VerniteMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: VerniteMessage>(&self) -> bool {
        self.message_type_id() == TypeId::of::<T>()
    }
}

impl Clone for Box<dyn DynMessage> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Implements [`VerniteMessage`], optionally reading the `action` field.
macro_rules! vernite_message {
    ($ty:ty) => {
        impl $crate::message::VerniteMessage for $ty {}
    };
    ($ty:ty, action) => {
        impl $crate::message::VerniteMessage for $ty {
            const HAS_ACTION: bool = true;

            fn action(&self) -> Option<$crate::messages::BasicAction> {
                self.action
                    .and_then(|action| $crate::messages::BasicAction::try_from(action).ok())
            }
        }
    };
}

pub(crate) use vernite_message;
