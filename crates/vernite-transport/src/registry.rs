//! # Type Registry
//!
//! Bidirectional lookup between dotted wire names (`vernite.Task`,
//! `vernite.CommunicatorModel.Message`) and local decoders / type identities.
//!
//! Built once from a [`SchemaNode`] tree:
//!
//! - `Message` nodes are recorded as `prefix.name`, then their nested nodes are
//!   walked with that name as the new prefix.
//! - `Package` nodes extend the prefix without being recorded.
//! - `Enum` nodes are skipped.
//!
//! Name collisions and types declared twice are rejected at build time, so the
//! name ↔ type mapping is a bijection for the registry's lifetime.

use crate::error::{RegistryError, TransportError};
use std::any::TypeId;
use std::collections::HashMap;
use tracing::{debug, info};
use vernite_schema::{DecodeFn, MessageDescriptor, SchemaNode, VerniteMessage};

/// Read-only registry of every concrete message type in a namespace.
#[derive(Debug)]
pub struct TypeRegistry {
    /// Dotted name -> descriptor.
    by_name: HashMap<String, MessageDescriptor>,
    /// Type identity -> dotted name.
    by_type: HashMap<TypeId, String>,
}

impl TypeRegistry {
    /// Registry over the `vernite` catalog.
    pub fn vernite() -> Result<Self, RegistryError> {
        Self::from_namespace(vernite_schema::namespace())
    }

    /// Walk `root` and register every message type beneath it.
    pub fn from_namespace(root: &SchemaNode) -> Result<Self, RegistryError> {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_type: HashMap::new(),
        };

        let prefix = root.name();
        if let Some(descriptor) = root.descriptor() {
            registry.insert(prefix, *descriptor)?;
        }
        registry.walk(prefix, root.children())?;

        if registry.is_empty() {
            return Err(RegistryError::Empty {
                root: prefix.to_string(),
            });
        }

        info!(root = prefix, types = registry.len(), "Type registry built");
        Ok(registry)
    }

    fn walk(&mut self, prefix: &str, nodes: &[SchemaNode]) -> Result<(), RegistryError> {
        for node in nodes {
            let dotted = format!("{prefix}.{}", node.name());
            match node {
                SchemaNode::Message {
                    descriptor, nested, ..
                } => {
                    self.insert(&dotted, *descriptor)?;
                    self.walk(&dotted, nested)?;
                }
                SchemaNode::Package { children, .. } => self.walk(&dotted, children)?,
                SchemaNode::Enum { .. } => {}
            }
        }
        Ok(())
    }

    fn insert(&mut self, dotted: &str, descriptor: MessageDescriptor) -> Result<(), RegistryError> {
        if self.by_name.contains_key(dotted) {
            return Err(RegistryError::DuplicateName {
                name: dotted.to_string(),
            });
        }

        if let Some(first) = self.by_type.get(&descriptor.type_id()) {
            return Err(RegistryError::DuplicateType {
                rust_type: descriptor.rust_name().to_string(),
                first: first.clone(),
                second: dotted.to_string(),
            });
        }

        debug!(
            type_name = dotted,
            rust_type = descriptor.rust_name(),
            "Registered message type"
        );
        self.by_name.insert(dotted.to_string(), descriptor);
        self.by_type.insert(descriptor.type_id(), dotted.to_string());
        Ok(())
    }

    /// Decoder for a wire name.
    pub fn resolve_decoder(&self, type_name: &str) -> Result<DecodeFn, TransportError> {
        self.descriptor(type_name).map(|descriptor| descriptor.decoder())
    }

    /// Type identity for a wire name.
    pub fn resolve_type_id(&self, type_name: &str) -> Result<TypeId, TransportError> {
        self.descriptor(type_name).map(|descriptor| descriptor.type_id())
    }

    /// Whether the type named `type_name` carries an `action` field.
    pub fn has_action(&self, type_name: &str) -> Result<bool, TransportError> {
        self.descriptor(type_name).map(|descriptor| descriptor.has_action())
    }

    fn descriptor(&self, type_name: &str) -> Result<&MessageDescriptor, TransportError> {
        self.by_name
            .get(type_name)
            .ok_or_else(|| TransportError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Wire name for a type identity.
    pub fn resolve_name(&self, type_id: TypeId) -> Result<&str, TransportError> {
        self.by_type
            .get(&type_id)
            .map(String::as_str)
            .ok_or_else(|| TransportError::UnregisteredType {
                rust_type: format!("{type_id:?}"),
            })
    }

    /// Wire name for `T`.
    pub fn resolve_name_of<T: VerniteMessage>(&self) -> Result<&str, TransportError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(String::as_str)
            .ok_or_else(|| TransportError::UnregisteredType {
                rust_type: std::any::type_name::<T>().to_string(),
            })
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All registered wire names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
