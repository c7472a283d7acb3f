//! Field name resolution.
//!
//! The wire carries field identifiers, not names. When a schema registry is
//! attached, the resolver maps the message's method name and kind to a struct
//! type name (see [`tables`]), asks the registry for that struct's field
//! descriptors and projects them into an id to name table.
//!
//! # Scope of a name table
//!
//! One table is built per message, from the top-level struct's schema, and is
//! applied at every nesting level. The wire carries no type information for
//! nested structs, so an inner struct whose ids overlap the outer struct's
//! will show the outer names. Existing tooling navigates decoded trees by
//! those names (`operationHandle.operationHandle...`), so this is kept.
//!
//! The registry is only ever used for naming. Values are always decoded
//! according to the tag read from the wire.

pub mod memory;
pub mod report;
pub mod tables;

use std::collections::HashMap;

use rpcscope_proto::{MessageKind, TypeTag};
use serde::Serialize;

pub use self::{
    memory::StaticRegistry,
    report::{EXTENSION_FIELD_BASE, SchemaReport, check_descriptors},
    tables::{PROTOCOL_FAMILY, is_known_method, request_struct_name, response_struct_name},
};
use crate::value::{FieldNames, GenericReason};

/// One field of a struct schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field identifier
    pub field_id: i16,
    /// Declared type tag (informational only)
    pub wire_type: u8,
    /// Semantic field name
    pub field_name: String,
}

impl FieldDescriptor {
    /// Create a descriptor
    #[must_use]
    pub fn new(field_id: i16, wire_type: TypeTag, field_name: impl Into<String>) -> Self {
        Self { field_id, wire_type: wire_type.to_u8(), field_name: field_name.into() }
    }
}

/// Source of struct schemas, keyed by struct type name.
///
/// Implementations are read-only once built and may be shared by any number
/// of concurrent decodes.
pub trait SchemaRegistry: Send + Sync {
    /// Ordered field descriptors of `struct_name`, or `None` if unknown
    fn lookup_field_descriptors(&self, struct_name: &str) -> Option<&[FieldDescriptor]>;
}

/// Field id to name table for one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldNameMap {
    names: HashMap<i16, String>,
}

impl FieldNameMap {
    /// Empty table: every key falls back to `field_<id>`
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Project descriptors into a table. A repeated id keeps its last name.
    #[must_use]
    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> Self {
        let names = descriptors.iter().map(|d| (d.field_id, d.field_name.clone())).collect();
        Self { names }
    }

    /// Name for `field_id`, if known
    #[must_use]
    pub fn get(&self, field_id: i16) -> Option<&str> {
        self.names.get(&field_id).map(String::as_str)
    }

    /// Key to store a field under: its name, or `field_<id>`
    #[must_use]
    pub fn key_for(&self, field_id: i16) -> String {
        match self.get(field_id) {
            Some(name) => name.to_owned(),
            None => format!("field_{field_id}"),
        }
    }

    /// Number of mappings
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if there are no mappings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Struct type name carrying the body of a `kind` message for `method`.
///
/// Only calls and replies have an associated struct; exceptions, one-way and
/// unknown kinds never resolve.
#[must_use]
pub fn struct_name_for(method: &str, kind: MessageKind) -> Option<&'static str> {
    match kind {
        MessageKind::Call => request_struct_name(method),
        MessageKind::Reply => response_struct_name(method),
        MessageKind::Exception | MessageKind::OneWay | MessageKind::Unknown(_) => None,
    }
}

/// Builds id to name tables from an optional registry.
#[derive(Clone, Copy, Default)]
pub struct FieldNameResolver<'r> {
    registry: Option<&'r dyn SchemaRegistry>,
}

impl<'r> FieldNameResolver<'r> {
    /// Create a resolver. `None` makes every lookup come back empty.
    #[must_use]
    pub fn new(registry: Option<&'r dyn SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Id to name table for a message, empty if nothing applies.
    #[must_use]
    pub fn build_field_name_map(&self, method: &str, kind: MessageKind) -> FieldNameMap {
        self.resolve(method, kind).0
    }

    /// Id to name table plus a description of where it came from.
    #[must_use]
    pub fn resolve(&self, method: &str, kind: MessageKind) -> (FieldNameMap, FieldNames) {
        let Some(registry) = self.registry else {
            return (FieldNameMap::empty(), FieldNames::Generic(GenericReason::NoRegistry));
        };

        let descriptors = struct_name_for(method, kind).and_then(|struct_name| {
            registry.lookup_field_descriptors(struct_name).map(|d| (struct_name, d))
        });

        match descriptors {
            Some((struct_name, descriptors)) if !descriptors.is_empty() => {
                let map = FieldNameMap::from_descriptors(descriptors);
                tracing::debug!(
                    method,
                    struct_name,
                    mappings = map.len(),
                    "Resolved field names from schema"
                );
                let names = FieldNames::Resolved { struct_name, mappings: map.len() };
                (map, names)
            },
            _ => {
                tracing::trace!(method, %kind, "No schema mapping for message");
                (FieldNameMap::empty(), FieldNames::Generic(GenericReason::NoMapping))
            },
        }
    }
}

impl std::fmt::Debug for FieldNameResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldNameResolver")
            .field("has_registry", &self.registry.is_some())
            .finish()
    }
}
