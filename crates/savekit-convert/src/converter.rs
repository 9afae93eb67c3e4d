//! Value converters and the explicit registration table that feeds them.
//!
//! A converter maps one concrete type to a JSON-safe form and back. It is
//! stateless and keyed by the exact `TypeId` of its target; there is no
//! inheritance-aware or structural matching.
//!
//! Population replaces assembly scanning with [`ConverterCatalog`]s: each
//! catalog is one "code unit" that lists [`ConverterFactory`] entries. A
//! catalog or factory that fails is logged and skipped by the registry.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::value::{FieldType, SaveValue, Value};
use crate::ConversionError;

// ---------------------------------------------------------------------------
// ValueConverter -- typed
// ---------------------------------------------------------------------------

/// A stateless, bidirectional mapping for one concrete type.
///
/// Implementations must obey the round-trip law:
/// `from_json(&to_json(&x)?)` reconstructs a value equal to `x` within the
/// precision of the JSON form.
pub trait ValueConverter: Send + Sync + 'static {
    /// The type this converter handles.
    type Target: SaveValue + Clone;

    /// Encode a value.
    fn to_json(&self, value: &Self::Target) -> Result<JsonValue, ConversionError>;

    /// Decode a value. Permissive decoders return a default instead of
    /// failing on short or absent input.
    fn from_json(&self, json: &JsonValue) -> Result<Self::Target, ConversionError>;

    /// Value produced for `null` input.
    fn default_value(&self) -> Result<Self::Target, ConversionError> {
        self.from_json(&JsonValue::Null)
    }
}

// ---------------------------------------------------------------------------
// DynConverter -- type-erased
// ---------------------------------------------------------------------------

/// Object-safe view of a [`ValueConverter`], stored in the registry.
pub trait DynConverter: Send + Sync {
    /// Declared type handled by this converter.
    fn target_type(&self) -> FieldType;

    /// Registry key.
    fn target_id(&self) -> TypeId;

    /// Display name of the target type.
    fn target_name(&self) -> String {
        self.target_type().name()
    }

    /// Encode a dynamic value of the target type.
    fn to_json_dyn(&self, value: &Value) -> Result<JsonValue, ConversionError>;

    /// Decode into a dynamic value of the target type.
    fn from_json_dyn(&self, json: &JsonValue) -> Result<Value, ConversionError>;

    /// Default value of the target type in dynamic form.
    fn default_dyn(&self) -> Result<Value, ConversionError>;
}

impl<C: ValueConverter> DynConverter for C {
    fn target_type(&self) -> FieldType {
        C::Target::field_type()
    }

    fn target_id(&self) -> TypeId {
        TypeId::of::<C::Target>()
    }

    fn to_json_dyn(&self, value: &Value) -> Result<JsonValue, ConversionError> {
        let typed = C::Target::from_value(value.clone())?;
        self.to_json(&typed)
    }

    fn from_json_dyn(&self, json: &JsonValue) -> Result<Value, ConversionError> {
        self.from_json(json).map(SaveValue::into_value)
    }

    fn default_dyn(&self) -> Result<Value, ConversionError> {
        self.default_value().map(SaveValue::into_value)
    }
}

impl fmt::Debug for dyn DynConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynConverter")
            .field("target", &self.target_name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Factories and catalogs
// ---------------------------------------------------------------------------

/// Constructor for one converter.
pub type ConverterCtor = fn() -> Result<Arc<dyn DynConverter>, ConversionError>;

/// A named converter constructor, the unit of registration.
#[derive(Clone, Copy)]
pub struct ConverterFactory {
    pub name: &'static str,
    pub create: ConverterCtor,
}

impl ConverterFactory {
    /// Factory for a converter with a no-argument constructor.
    pub fn of<C: ValueConverter + Default>(name: &'static str) -> Self {
        fn make<C: ValueConverter + Default>() -> Result<Arc<dyn DynConverter>, ConversionError> {
            Ok(Arc::new(C::default()))
        }
        Self {
            name,
            create: make::<C>,
        }
    }

    /// Factory with a custom constructor that may fail.
    pub const fn new(name: &'static str, create: ConverterCtor) -> Self {
        Self { name, create }
    }

    pub fn instantiate(&self) -> Result<Arc<dyn DynConverter>, ConversionError> {
        (self.create)()
    }
}

impl fmt::Debug for ConverterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterFactory")
            .field("name", &self.name)
            .finish()
    }
}

/// One unit of converter registrations.
pub trait ConverterCatalog: Send + Sync {
    fn name(&self) -> &str;

    /// Enumerate the factories of this unit. An error here skips the
    /// whole unit but not the others.
    fn factories(&self) -> Result<Vec<ConverterFactory>, ConversionError>;
}

/// A catalog backed by a static factory list.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    name: &'static str,
    factories: Vec<ConverterFactory>,
}

impl StaticCatalog {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            factories: Vec::new(),
        }
    }

    /// Add a default-constructible converter.
    pub fn with<C: ValueConverter + Default>(mut self) -> Self {
        self.factories
            .push(ConverterFactory::of::<C>(crate::value::short_type_name::<C>()));
        self
    }

    pub fn with_factory(mut self, factory: ConverterFactory) -> Self {
        self.factories.push(factory);
        self
    }
}

impl ConverterCatalog for StaticCatalog {
    fn name(&self) -> &str {
        self.name
    }

    fn factories(&self) -> Result<Vec<ConverterFactory>, ConversionError> {
        Ok(self.factories.clone())
    }
}
