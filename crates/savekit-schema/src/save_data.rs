//! The save data container.
//!
//! [`SaveData`] is one serialized snapshot: fully-qualified key -> JSON-safe
//! value. Keys are kept sorted so the persisted form is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use savekit_convert::registry::ConverterRegistry;
use savekit_convert::value::{FieldType, SaveValue, Value};
use savekit_convert::ConversionError;

use crate::SchemaError;

/// Build the fully-qualified key `"{object_id}.{component}.{field_key}"`.
pub fn full_key(object_id: &str, component: &str, field_key: &str) -> String {
    format!("{object_id}.{component}.{field_key}")
}

/// One snapshot of saved values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveData {
    values: BTreeMap<String, JsonValue>,
}

impl SaveData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: BTreeMap<String, JsonValue>) -> Self {
        Self { values }
    }

    pub fn into_map(self) -> BTreeMap<String, JsonValue> {
        self.values
    }

    pub fn as_map(&self) -> &BTreeMap<String, JsonValue> {
        &self.values
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidKey`] if `key` is empty.
    pub fn set_value(&mut self, key: impl Into<String>, value: JsonValue) -> Result<(), SchemaError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SchemaError::InvalidKey);
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Encode a typed value and store it.
    pub fn set<T: SaveValue>(
        &mut self,
        key: impl Into<String>,
        value: T,
        converters: &ConverterRegistry,
    ) -> Result<(), SchemaError> {
        let json = converters.converters().to_json(value)?;
        self.set_value(key, json)
    }

    /// The stored JSON value, unconverted.
    pub fn get_raw(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Value under `key` as `ty`.
    ///
    /// Returns `default` when the key is absent or conversion fails. A value
    /// that already has the target shape is returned without conversion.
    pub fn get_value(&self, key: &str, ty: &FieldType, default: Value, converters: &ConverterRegistry) -> Value {
        let Some(json) = self.values.get(key) else {
            return default;
        };
        match decode(json, ty, converters) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = %key, field_type = %ty, error = %e, "conversion failed -- using default");
                default
            }
        }
    }

    /// Typed form of [`get_value`](Self::get_value).
    pub fn get<T: SaveValue>(&self, key: &str, default: T, converters: &ConverterRegistry) -> T {
        let Some(json) = self.values.get(key) else {
            return default;
        };
        match decode(json, &T::field_type(), converters).and_then(T::from_value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "conversion failed -- using default");
                default
            }
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove `key`. Returns `false` if it was absent.
    pub fn remove_key(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// BLAKE3 hex digest of the canonical JSON form.
    pub fn content_hash(&self) -> String {
        // Serializing a string-keyed map of JSON values cannot fail.
        let bytes = serde_json::to_vec(&self.values).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }
}

fn decode(json: &JsonValue, ty: &FieldType, converters: &ConverterRegistry) -> Result<Value, ConversionError> {
    let converters = converters.converters();
    match converters.try_assign(json, ty) {
        Some(value) => Ok(value),
        None => converters.from_json_value(json, ty),
    }
}

impl FromIterator<(String, JsonValue)> for SaveData {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().filter(|(k, _)| !k.is_empty()).collect(),
        }
    }
}

impl IntoIterator for SaveData {
    type Item = (String, JsonValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
