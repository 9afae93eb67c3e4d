//! Savekit Schema -- field registry and save entry discovery.
//!
//! This crate maps component types to their saved fields. Each saved field
//! becomes a [`FieldEntry`](entry::FieldEntry) keyed by its save key and
//! carrying its load aliases and accessor. Entries come from generated
//! registries when one handles the type, or from a reflective scan
//! otherwise, and are cached per type by
//! [`SaveEntryDiscovery`](discovery::SaveEntryDiscovery).
//!
//! [`SaveData`](save_data::SaveData) is the snapshot container the
//! orchestrator fills on save and reads on load.

#![deny(unsafe_code)]

pub mod discovery;
pub mod entry;
pub mod reflect;
pub mod save_data;
pub mod validate;

pub use savekit_convert;

use savekit_convert::ConversionError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the field registry and the save data container.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Save data keys must be non-empty.
    #[error("save data key must not be empty")]
    InvalidKey,

    /// An accessor was applied to a component of another type.
    #[error("field entry of '{expected}' applied to a '{found}' component")]
    OwnerMismatch { expected: String, found: String },

    /// The component does not reflect a field with this name.
    #[error("component '{component}' has no reflected field '{field}'")]
    UnknownField { component: String, field: String },

    /// A generated registry was asked for a type it does not handle.
    #[error("registry '{registry}' does not handle component '{component}'")]
    UnhandledType { registry: String, component: String },

    /// A generated registry could not be constructed.
    #[error("failed to instantiate save registry '{name}': {details}")]
    Instantiation { name: String, details: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::discovery::{GeneratedSaveRegistry, RegistryCtor, SaveEntryDiscovery, StaticSaveRegistry};
    pub use crate::entry::{FieldAccessor, FieldEntry, SaveEntries};
    pub use crate::reflect::{Component, ComponentType, FieldInfo, GeneratedEntries, Reflected, SaveAttr};
    pub use crate::save_data::{full_key, SaveData};
    pub use crate::validate::{validate_component_types, IssueKind, ValidationIssue};
    pub use crate::SchemaError;
    pub use savekit_convert::prelude::*;
}
