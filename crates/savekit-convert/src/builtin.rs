//! Built-in converters for the engine math types.
//!
//! Every type serializes to a flat float array (`[x, y]`, `[x, y, z]`,
//! `[x, y, z, w]`, `[r, g, b, a]`, `[cx, cy, cz, sx, sy, sz]`). Decoding goes
//! through the numeric reader and is permissive: short or absent input
//! decodes to the type's fallback instead of failing.

use serde_json::{Map, Number, Value as JsonValue};

use crate::converter::{ConverterCatalog, ConverterFactory, ValueConverter};
use crate::math::{Bounds, Color, Quaternion, Vector2, Vector3, Vector4};
use crate::numeric::{get_ignore_case, read_float_array};
use crate::ConversionError;

/// Encode an `f32` using its shortest decimal form, so `0.1f32` is written
/// as `0.1` rather than `0.10000000149011612`.
pub fn f32_to_json(value: f32) -> Result<JsonValue, ConversionError> {
    if !value.is_finite() {
        return Err(ConversionError::NonFinite {
            value: f64::from(value),
        });
    }
    let widened = value.to_string().parse::<f64>().unwrap_or(f64::from(value));
    Number::from_f64(widened)
        .map(JsonValue::Number)
        .ok_or(ConversionError::NonFinite { value: widened })
}

fn float_array(values: &[f32]) -> Result<JsonValue, ConversionError> {
    values
        .iter()
        .map(|v| f32_to_json(*v))
        .collect::<Result<Vec<_>, _>>()
        .map(JsonValue::Array)
}

// ---------------------------------------------------------------------------
// Vectors and rotation
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct Vector2Converter;

impl ValueConverter for Vector2Converter {
    type Target = Vector2;

    fn to_json(&self, v: &Vector2) -> Result<JsonValue, ConversionError> {
        float_array(&[v.x, v.y])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Vector2, ConversionError> {
        Ok(match read_float_array(json)[..] {
            [x, y, ..] => Vector2::new(x, y),
            _ => Vector2::ZERO,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Vector3Converter;

impl ValueConverter for Vector3Converter {
    type Target = Vector3;

    fn to_json(&self, v: &Vector3) -> Result<JsonValue, ConversionError> {
        float_array(&[v.x, v.y, v.z])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Vector3, ConversionError> {
        Ok(vector3_from(&read_float_array(json)).unwrap_or(Vector3::ZERO))
    }
}

fn vector3_from(values: &[f32]) -> Option<Vector3> {
    match *values {
        [x, y, z, ..] => Some(Vector3::new(x, y, z)),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Vector4Converter;

impl ValueConverter for Vector4Converter {
    type Target = Vector4;

    fn to_json(&self, v: &Vector4) -> Result<JsonValue, ConversionError> {
        float_array(&[v.x, v.y, v.z, v.w])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Vector4, ConversionError> {
        Ok(match read_float_array(json)[..] {
            [x, y, z, w, ..] => Vector4::new(x, y, z, w),
            _ => Vector4::ZERO,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QuaternionConverter;

impl ValueConverter for QuaternionConverter {
    type Target = Quaternion;

    fn to_json(&self, q: &Quaternion) -> Result<JsonValue, ConversionError> {
        float_array(&[q.x, q.y, q.z, q.w])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Quaternion, ConversionError> {
        Ok(match read_float_array(json)[..] {
            [x, y, z, w, ..] => Quaternion::new(x, y, z, w),
            _ => Quaternion::IDENTITY,
        })
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Alpha defaults to `1.0` when only three channels are present; fewer than
/// three channels decode to [`Color::WHITE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorConverter;

impl ValueConverter for ColorConverter {
    type Target = Color;

    fn to_json(&self, c: &Color) -> Result<JsonValue, ConversionError> {
        float_array(&[c.r, c.g, c.b, c.a])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Color, ConversionError> {
        Ok(match read_float_array(json)[..] {
            [r, g, b, a, ..] => Color::new(r, g, b, a),
            [r, g, b] => Color::rgb(r, g, b),
            _ => Color::WHITE,
        })
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Decoding precedence for objects: `center` + `size`, then `min` + `max`,
/// then a flat array of at least six numbers. A matching key pair whose
/// parts hold fewer than three numbers yields the default box.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundsConverter;

impl ValueConverter for BoundsConverter {
    type Target = Bounds;

    fn to_json(&self, b: &Bounds) -> Result<JsonValue, ConversionError> {
        let (c, s) = (b.center, b.size);
        float_array(&[c.x, c.y, c.z, s.x, s.y, s.z])
    }

    fn from_json(&self, json: &JsonValue) -> Result<Bounds, ConversionError> {
        if let JsonValue::Object(map) = json {
            if let Some((center, size)) = key_pair(map, "center", "size") {
                return Ok(center
                    .zip(size)
                    .map(|(center, size)| Bounds::new(center, size))
                    .unwrap_or_default());
            }
            if let Some((min, max)) = key_pair(map, "min", "max") {
                return Ok(min
                    .zip(max)
                    .map(|(min, max)| Bounds::from_min_max(min, max))
                    .unwrap_or_default());
            }
        }

        Ok(match read_float_array(json)[..] {
            [cx, cy, cz, sx, sy, sz, ..] => {
                Bounds::new(Vector3::new(cx, cy, cz), Vector3::new(sx, sy, sz))
            }
            _ => Bounds::default(),
        })
    }
}

/// Both keys present: each side decoded as a vector, `None` when too short.
fn key_pair(
    map: &Map<String, JsonValue>,
    first: &str,
    second: &str,
) -> Option<(Option<Vector3>, Option<Vector3>)> {
    let a = get_ignore_case(map, first)?;
    let b = get_ignore_case(map, second)?;
    Some((
        vector3_from(&read_float_array(a)),
        vector3_from(&read_float_array(b)),
    ))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Registration table for the built-in converters.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinConverters;

impl ConverterCatalog for BuiltinConverters {
    fn name(&self) -> &str {
        "builtin"
    }

    fn factories(&self) -> Result<Vec<ConverterFactory>, ConversionError> {
        Ok(vec![
            ConverterFactory::of::<Vector2Converter>("Vector2Converter"),
            ConverterFactory::of::<Vector3Converter>("Vector3Converter"),
            ConverterFactory::of::<Vector4Converter>("Vector4Converter"),
            ConverterFactory::of::<QuaternionConverter>("QuaternionConverter"),
            ConverterFactory::of::<ColorConverter>("ColorConverter"),
            ConverterFactory::of::<BoundsConverter>("BoundsConverter"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vectors_encode_as_float_arrays() {
        let v = Vector3Converter.to_json(&Vector3::new(1.5, 2.5, 3.5)).unwrap();
        assert_eq!(v, json!([1.5, 2.5, 3.5]));
        let v = Vector2Converter.to_json(&Vector2::new(0.1, -0.2)).unwrap();
        assert_eq!(v, json!([0.1, -0.2]));
    }

    #[test]
    fn non_finite_components_are_rejected() {
        let err = Vector2Converter.to_json(&Vector2::new(f32::NAN, 0.0)).unwrap_err();
        assert!(matches!(err, ConversionError::NonFinite { .. }));
    }

    #[test]
    fn short_input_uses_fallbacks() {
        assert_eq!(Vector3Converter.from_json(&json!([1, 2])).unwrap(), Vector3::ZERO);
        assert_eq!(QuaternionConverter.from_json(&json!(null)).unwrap(), Quaternion::IDENTITY);
        assert_eq!(ColorConverter.from_json(&json!([0.5])).unwrap(), Color::WHITE);
        assert_eq!(Vector4Converter.from_json(&json!([])).unwrap(), Vector4::ZERO);
    }

    #[test]
    fn extra_components_are_ignored() {
        assert_eq!(Vector2Converter.from_json(&json!([1, 2, 3])).unwrap(), Vector2::new(1.0, 2.0));
    }

    #[test]
    fn color_alpha_defaults_to_opaque() {
        assert_eq!(ColorConverter.from_json(&json!([0.2, 0.4, 0.6])).unwrap(), Color::rgb(0.2, 0.4, 0.6));
        assert_eq!(
            ColorConverter.from_json(&json!({"r": 0.2, "g": 0.4, "b": 0.6})).unwrap(),
            Color::rgb(0.2, 0.4, 0.6)
        );
    }

    #[test]
    fn bounds_center_size_and_min_max_agree() {
        let a = BoundsConverter
            .from_json(&json!({"center": [0, 0, 0], "size": [2, 2, 2]}))
            .unwrap();
        let b = BoundsConverter
            .from_json(&json!({"min": [-1, -1, -1], "max": [1, 1, 1]}))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn bounds_swapped_corners_have_positive_size() {
        let b = BoundsConverter
            .from_json(&json!({"Min": {"x": 1, "y": 1, "z": 1}, "Max": {"x": -1, "y": -1, "z": -1}}))
            .unwrap();
        assert_eq!(b.size, Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(b.center, Vector3::ZERO);
    }

    #[test]
    fn bounds_short_key_pair_does_not_fall_through() {
        let b = BoundsConverter
            .from_json(&json!({"center": [1, 2], "size": [1, 1, 1], "x": 1, "y": 2, "z": 3, "w": 4, "v": 5, "u": 6}))
            .unwrap();
        assert_eq!(b, Bounds::default());
    }

    #[test]
    fn bounds_flat_array_needs_six_numbers() {
        let b = BoundsConverter.from_json(&json!([1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(b, Bounds::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)));
        assert_eq!(BoundsConverter.from_json(&json!([1, 2, 3, 4, 5])).unwrap(), Bounds::default());
    }

    #[test]
    fn catalog_lists_all_builtins() {
        let factories = BuiltinConverters.factories().unwrap();
        assert_eq!(factories.len(), 6);
        assert!(factories.iter().all(|f| f.instantiate().is_ok()));
    }
}
