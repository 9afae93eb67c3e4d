//! Savekit Convert -- type conversion engine for saved field values.
//!
//! This crate decides, for any declared field type, how a value is written
//! to a JSON-safe form and reconstructed from it. Primitives, strings,
//! enums, arrays and lists are handled generically; fixed-shape struct
//! types (vectors, colors, rotations, bounds, user types) are handled by
//! converters held in a [`ConverterRegistry`](registry::ConverterRegistry).
//!
//! # Quick Start
//!
//! ```
//! use savekit_convert::prelude::*;
//! use serde_json::json;
//!
//! let registry = ConverterRegistry::with_builtins();
//! let converters = registry.converters();
//!
//! let json = converters.to_json(Vector3::new(1.5, 2.5, 3.5)).unwrap();
//! assert_eq!(json, json!([1.5, 2.5, 3.5]));
//!
//! let back: Vector3 = converters.from_json(&json!({"x": 1.5, "y": 2.5, "z": 3.5})).unwrap();
//! assert_eq!(back, Vector3::new(1.5, 2.5, 3.5));
//! ```

#![deny(unsafe_code)]

pub mod builtin;
pub mod converter;
pub mod facade;
pub mod math;
pub mod numeric;
pub mod registry;
pub mod value;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while converting values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// The declared type has no primitive, enum, container or converter support.
    #[error("type '{type_name}' is not supported for saving")]
    UnsupportedType { type_name: String },

    /// A value did not have the shape its declared type requires.
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// An integer does not fit the target primitive.
    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: String },

    /// NaN and infinities have no JSON representation.
    #[error("non-finite float {value} cannot be written as JSON")]
    NonFinite { value: f64 },

    /// An enum variant name that the enum does not declare.
    #[error("'{variant}' is not a variant of {enum_name}")]
    UnknownVariant { enum_name: String, variant: String },

    /// A converter or catalog could not be constructed.
    #[error("failed to instantiate '{name}': {details}")]
    Instantiation { name: String, details: String },
}

impl ConversionError {
    /// Build a [`ConversionError::TypeMismatch`] from the expected type name
    /// and the offending value.
    pub fn mismatch(expected: impl Into<String>, found: &value::Value) -> Self {
        ConversionError::TypeMismatch {
            expected: expected.into(),
            found: found.kind().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::builtin::{
        BoundsConverter, BuiltinConverters, ColorConverter, QuaternionConverter, Vector2Converter,
        Vector3Converter, Vector4Converter,
    };
    pub use crate::converter::{
        ConverterCatalog, ConverterFactory, DynConverter, StaticCatalog, ValueConverter,
    };
    pub use crate::facade::Converters;
    pub use crate::math::{Bounds, Color, Quaternion, Vector2, Vector3, Vector4};
    pub use crate::numeric::{read_float_array, read_float_iter, read_int_array, read_value_float_array};
    pub use crate::registry::ConverterRegistry;
    pub use crate::value::{EnumType, FieldType, Primitive, SaveValue, StructType, Value};
    pub use crate::ConversionError;
}
