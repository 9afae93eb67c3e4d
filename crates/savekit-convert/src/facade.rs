//! The conversion façade.
//!
//! [`Converters`] routes primitives, strings, enums, arrays and lists
//! generically and defers struct types to the [`ConverterRegistry`]. The
//! declared [`FieldType`] drives dispatch, never the runtime shape of the
//! value.

use serde_json::{Number, Value as JsonValue};

use crate::builtin::f32_to_json;
use crate::registry::ConverterRegistry;
use crate::value::{EnumType, FieldType, Primitive, SaveValue, Value};
use crate::ConversionError;

/// Borrowed view over a registry that performs conversions.
#[derive(Debug, Clone, Copy)]
pub struct Converters<'a> {
    registry: &'a ConverterRegistry,
}

impl<'a> Converters<'a> {
    pub fn new(registry: &'a ConverterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a ConverterRegistry {
        self.registry
    }

    pub fn is_supported(&self, ty: &FieldType) -> bool {
        self.registry.is_supported(ty)
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    /// Encode a native value declared as `ty`.
    ///
    /// # Errors
    ///
    /// [`ConversionError::UnsupportedType`] for struct types without a
    /// converter, [`ConversionError::TypeMismatch`] when the value cannot be
    /// the declared type, [`ConversionError::NonFinite`] for NaN/infinite
    /// floats.
    pub fn to_json_value(&self, value: &Value, ty: &FieldType) -> Result<JsonValue, ConversionError> {
        if value.is_null() {
            return Ok(JsonValue::Null);
        }
        if let Some(converter) = self.registry.converter_for(ty) {
            return converter.to_json_dyn(value);
        }

        match ty {
            FieldType::Enum(info) => encode_enum(value, info),
            FieldType::Array(elem) | FieldType::List(elem) => match value {
                Value::Seq(items) => items
                    .iter()
                    .map(|item| self.to_json_value(item, elem))
                    .collect::<Result<Vec<_>, _>>()
                    .map(JsonValue::Array),
                other => Err(ConversionError::mismatch(ty.name(), other)),
            },
            FieldType::Struct(s) => Err(ConversionError::UnsupportedType {
                type_name: s.name.to_owned(),
            }),
            FieldType::Primitive(p) => encode_scalar(value, Some(*p)),
            FieldType::String => encode_scalar(value, None),
        }
    }

    /// Typed convenience wrapper over [`to_json_value`](Self::to_json_value).
    pub fn to_json<T: SaveValue>(&self, value: T) -> Result<JsonValue, ConversionError> {
        self.to_json_value(&value.into_value(), &T::field_type())
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    /// Return the value unchanged when the JSON shape already is the target
    /// type, with no coercion. `None` means conversion is required.
    pub fn try_assign(&self, json: &JsonValue, ty: &FieldType) -> Option<Value> {
        match (ty, json) {
            (FieldType::Primitive(Primitive::Bool), JsonValue::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::Primitive(Primitive::I64), JsonValue::Number(n)) => n.as_i64().map(Value::Int),
            (FieldType::Primitive(Primitive::F64), JsonValue::Number(n)) => n.as_f64().map(Value::Float),
            (FieldType::String, JsonValue::String(s)) => Some(Value::String(s.clone())),
            _ => None,
        }
    }

    /// Decode a JSON value into a native value of type `ty`.
    ///
    /// `null` yields the type default. Enums accept a variant name (any
    /// case) or index. Arrays and lists accept a bare scalar as a
    /// one-element sequence. Primitives coerce leniently and fall back to
    /// their default when the input cannot be represented.
    ///
    /// # Errors
    ///
    /// [`ConversionError::UnsupportedType`] for struct types without a
    /// converter, or whatever error a registered converter returns.
    pub fn from_json_value(&self, json: &JsonValue, ty: &FieldType) -> Result<Value, ConversionError> {
        if json.is_null() {
            return self.default_value(ty);
        }
        if let Some(value) = self.try_assign(json, ty) {
            return Ok(value);
        }
        if let Some(converter) = self.registry.converter_for(ty) {
            return converter.from_json_dyn(json);
        }

        match ty {
            FieldType::Enum(info) => decode_enum(json, info),
            FieldType::Array(elem) | FieldType::List(elem) => {
                let items = match json {
                    JsonValue::Array(items) => items
                        .iter()
                        .map(|item| self.from_json_value(item, elem))
                        .collect::<Result<Vec<_>, _>>()?,
                    scalar => vec![self.from_json_value(scalar, elem)?],
                };
                Ok(Value::Seq(items))
            }
            FieldType::Struct(s) => Err(ConversionError::UnsupportedType {
                type_name: s.name.to_owned(),
            }),
            FieldType::Primitive(p) => Ok(coerce_primitive(json, *p)),
            FieldType::String => Ok(Value::String(match json {
                JsonValue::String(s) => s.clone(),
                JsonValue::Number(n) => n.to_string(),
                JsonValue::Bool(b) => b.to_string(),
                JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => String::new(),
            })),
        }
    }

    /// Typed convenience wrapper over [`from_json_value`](Self::from_json_value).
    pub fn from_json<T: SaveValue>(&self, json: &JsonValue) -> Result<T, ConversionError> {
        T::from_value(self.from_json_value(json, &T::field_type())?)
    }

    /// Default value of a declared type.
    ///
    /// Struct types use their converter's decoding of `null`; enums use the
    /// first declared variant.
    pub fn default_value(&self, ty: &FieldType) -> Result<Value, ConversionError> {
        if let Some(converter) = self.registry.converter_for(ty) {
            return converter.default_dyn();
        }
        match ty {
            FieldType::Primitive(p) => Ok(primitive_default(*p)),
            FieldType::String => Ok(Value::String(String::new())),
            FieldType::Array(_) | FieldType::List(_) => Ok(Value::Seq(Vec::new())),
            FieldType::Enum(info) => info
                .variant_at(0)
                .map(|v| Value::Enum(v.to_owned()))
                .ok_or_else(|| ConversionError::UnknownVariant {
                    enum_name: info.name.to_owned(),
                    variant: String::new(),
                }),
            FieldType::Struct(s) => Err(ConversionError::UnsupportedType {
                type_name: s.name.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn encode_scalar(value: &Value, prim: Option<Primitive>) -> Result<JsonValue, ConversionError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Int(i) => Ok(JsonValue::from(*i)),
        Value::Float(f) if prim == Some(Primitive::F32) => f32_to_json(*f as f32),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or(ConversionError::NonFinite { value: *f }),
        Value::Char(c) => Ok(JsonValue::String(c.to_string())),
        Value::String(s) | Value::Enum(s) => Ok(JsonValue::String(s.clone())),
        other @ (Value::Seq(_) | Value::Struct(_)) => Err(ConversionError::mismatch(
            prim.map_or("String", Primitive::name),
            other,
        )),
    }
}

fn primitive_default(p: Primitive) -> Value {
    match p {
        Primitive::Bool => Value::Bool(false),
        Primitive::F32 | Primitive::F64 => Value::Float(0.0),
        Primitive::Char => Value::Char('\0'),
        _ => Value::Int(0),
    }
}

/// Lenient scalar coercion. Input that cannot be represented as `p`
/// produces the primitive's default.
fn coerce_primitive(json: &JsonValue, p: Primitive) -> Value {
    let coerced = match p {
        Primitive::Bool => coerce_bool(json).map(Value::Bool),
        Primitive::Char => coerce_char(json).map(Value::Char),
        Primitive::F32 => coerce_f64(json).map(|f| Value::Float(f64::from(f as f32))),
        Primitive::F64 => coerce_f64(json).map(Value::Float),
        _ => coerce_int(json, p).map(Value::Int),
    };
    coerced.unwrap_or_else(|| {
        tracing::debug!(primitive = p.name(), input = %json, "coercion failed, using default");
        primitive_default(p)
    })
}

fn coerce_bool(json: &JsonValue) -> Option<bool> {
    match json {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0),
        JsonValue::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn coerce_f64(json: &JsonValue) -> Option<f64> {
    match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn coerce_int(json: &JsonValue, p: Primitive) -> Option<i64> {
    let raw = match json {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(round_f64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_f64))
        }
        JsonValue::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }?;
    let (min, max) = p.int_range()?;
    (min..=max).contains(&raw).then_some(raw)
}

#[allow(clippy::cast_possible_truncation)]
fn round_f64(f: f64) -> Option<i64> {
    let r = f.round_ties_even();
    (r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64).then_some(r as i64)
}

fn coerce_char(json: &JsonValue) -> Option<char> {
    match json {
        JsonValue::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
        JsonValue::Number(n) => n
            .as_u64()
            .and_then(|u| u32::try_from(u).ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

fn encode_enum(value: &Value, info: &EnumType) -> Result<JsonValue, ConversionError> {
    match value {
        Value::Enum(name) | Value::String(name) => Ok(JsonValue::String(name.clone())),
        Value::Int(i) => info
            .variant_at(*i)
            .map(|v| JsonValue::String(v.to_owned()))
            .ok_or_else(|| ConversionError::UnknownVariant {
                enum_name: info.name.to_owned(),
                variant: i.to_string(),
            }),
        other => Err(ConversionError::mismatch(info.name, other)),
    }
}

fn decode_enum(json: &JsonValue, info: &EnumType) -> Result<Value, ConversionError> {
    let found = match json {
        JsonValue::String(s) => info.variant_named(s).or_else(|| {
            s.trim()
                .parse::<i64>()
                .ok()
                .and_then(|i| info.variant_at(i))
        }),
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(round_f64))
            .and_then(|i| info.variant_at(i)),
        JsonValue::Bool(b) => info.variant_at(i64::from(*b)),
        _ => None,
    };
    match found {
        Some(name) => Ok(Value::Enum(name.to_owned())),
        None => {
            tracing::debug!(enum_name = info.name, input = %json, "unknown enum value, using default");
            info.variant_at(0)
                .map(|v| Value::Enum(v.to_owned()))
                .ok_or_else(|| ConversionError::UnknownVariant {
                    enum_name: info.name.to_owned(),
                    variant: json.to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Color, Quaternion, Vector3};
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Faction {
        Neutral,
        Rebel,
        Empire,
    }
    crate::save_enum!(Faction { Neutral, Rebel, Empire });

    #[derive(Debug, Clone, PartialEq)]
    struct Opaque;
    crate::save_struct!(Opaque);

    fn registry() -> ConverterRegistry {
        ConverterRegistry::with_builtins()
    }

    #[test]
    fn primitives_pass_through() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.to_json(100i32).unwrap(), json!(100));
        assert_eq!(c.to_json(true).unwrap(), json!(true));
        assert_eq!(c.to_json(String::from("hi")).unwrap(), json!("hi"));
        assert_eq!(c.to_json(0.1f32).unwrap(), json!(0.1));
        assert_eq!(c.to_json('z').unwrap(), json!("z"));
    }

    #[test]
    fn null_value_encodes_as_null() {
        let reg = registry();
        let out = reg.converters().to_json_value(&Value::Null, &FieldType::of::<Vector3>());
        assert_eq!(out.unwrap(), JsonValue::Null);
    }

    #[test]
    fn null_json_decodes_to_defaults() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.from_json::<i32>(&JsonValue::Null).unwrap(), 0);
        assert_eq!(c.from_json::<String>(&JsonValue::Null).unwrap(), "");
        assert!(c.from_json::<Vec<u8>>(&JsonValue::Null).unwrap().is_empty());
        assert_eq!(c.from_json::<Quaternion>(&JsonValue::Null).unwrap(), Quaternion::IDENTITY);
        assert_eq!(c.from_json::<Color>(&JsonValue::Null).unwrap(), Color::WHITE);
        assert_eq!(c.from_json::<Faction>(&JsonValue::Null).unwrap(), Faction::Neutral);
    }

    #[test]
    fn enums_by_name_or_index() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.to_json(Faction::Rebel).unwrap(), json!("Rebel"));
        assert_eq!(c.from_json::<Faction>(&json!("empire")).unwrap(), Faction::Empire);
        assert_eq!(c.from_json::<Faction>(&json!(1)).unwrap(), Faction::Rebel);
        assert_eq!(c.from_json::<Faction>(&json!("2")).unwrap(), Faction::Empire);
        assert_eq!(c.from_json::<Faction>(&json!("Pirate")).unwrap(), Faction::Neutral);
        assert_eq!(c.from_json::<Faction>(&json!(42)).unwrap(), Faction::Neutral);
    }

    #[test]
    fn integer_coercion_rounds_and_clamps_to_default() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.from_json::<i32>(&json!(2.5)).unwrap(), 2);
        assert_eq!(c.from_json::<i32>(&json!(3.5)).unwrap(), 4);
        assert_eq!(c.from_json::<i32>(&json!("17")).unwrap(), 17);
        assert_eq!(c.from_json::<u8>(&json!(300)).unwrap(), 0);
        assert_eq!(c.from_json::<u8>(&json!(-1)).unwrap(), 0);
        assert_eq!(c.from_json::<i64>(&json!("nope")).unwrap(), 0);
        assert_eq!(c.from_json::<i16>(&json!(true)).unwrap(), 1);
    }

    #[test]
    fn float_and_bool_coercion() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.from_json::<f32>(&json!("1.25")).unwrap(), 1.25);
        assert_eq!(c.from_json::<f64>(&json!(7)).unwrap(), 7.0);
        assert!(c.from_json::<bool>(&json!("TRUE")).unwrap());
        assert!(c.from_json::<bool>(&json!(2)).unwrap());
        assert!(!c.from_json::<bool>(&json!([true])).unwrap());
        assert_eq!(c.from_json::<char>(&json!("q")).unwrap(), 'q');
        assert_eq!(c.from_json::<char>(&json!("qq")).unwrap(), '\0');
    }

    #[test]
    fn try_assign_only_for_native_shapes() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.try_assign(&json!(5), &FieldType::of::<i64>()), Some(Value::Int(5)));
        assert_eq!(c.try_assign(&json!("a"), &FieldType::of::<String>()), Some(Value::String("a".into())));
        assert_eq!(c.try_assign(&json!(5), &FieldType::of::<i32>()), None);
        assert_eq!(c.try_assign(&json!([1, 2, 3]), &FieldType::of::<Vector3>()), None);
    }

    #[test]
    fn sequences_recurse_with_element_type() {
        let reg = registry();
        let c = reg.converters();
        let path = vec![Vector3::new(1.0, 2.0, 3.0), Vector3::ZERO];
        let json = c.to_json(path.clone()).unwrap();
        assert_eq!(json, json!([[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]));
        assert_eq!(c.from_json::<Vec<Vector3>>(&json).unwrap(), path);

        let nested: Box<[Vec<i32>]> = vec![vec![1, 2], vec![]].into_boxed_slice();
        let json = c.to_json(nested.clone()).unwrap();
        assert_eq!(json, json!([[1, 2], []]));
        assert_eq!(c.from_json::<Box<[Vec<i32>]>>(&json).unwrap(), nested);
    }

    #[test]
    fn bare_scalar_becomes_one_element_sequence() {
        let reg = registry();
        let c = reg.converters();
        assert_eq!(c.from_json::<Vec<i32>>(&json!(9)).unwrap(), vec![9]);
        assert_eq!(&*c.from_json::<Box<[String]>>(&json!("solo")).unwrap(), &["solo".to_owned()]);
    }

    #[test]
    fn unsupported_struct_is_an_error() {
        let reg = registry();
        let c = reg.converters();
        assert!(matches!(c.to_json(Opaque), Err(ConversionError::UnsupportedType { .. })));
        assert!(matches!(
            c.from_json::<Opaque>(&json!({})),
            Err(ConversionError::UnsupportedType { .. })
        ));
        assert!(!c.is_supported(&FieldType::of::<Vec<Opaque>>()));
    }

    #[test]
    fn non_finite_floats_fail_to_encode() {
        let reg = registry();
        assert!(matches!(
            reg.converters().to_json(f64::INFINITY),
            Err(ConversionError::NonFinite { .. })
        ));
    }
}
