//! Permissive numeric sequence reader.
//!
//! Fixed-arity struct converters (vectors, colors, rotations, bounds) accept
//! many input shapes. Everything funnels through [`read_float_array`], which
//! is total: it never fails and returns an empty sequence for input it does
//! not recognise. Unparseable leaves coerce to `0.0`.

use serde_json::{Map, Value as JsonValue};

use crate::math::{Bounds, Color, Quaternion, Vector2, Vector3, Vector4};
use crate::value::Value;

const VECTOR_KEYS: [&str; 4] = ["x", "y", "z", "w"];
const COLOR_KEYS: [&str; 4] = ["r", "g", "b", "a"];

// ---------------------------------------------------------------------------
// JSON input
// ---------------------------------------------------------------------------

/// Flatten a JSON value into a float sequence.
///
/// Dispatch order:
/// 1. `null` yields an empty sequence.
/// 2. Objects try the `x,y,z,w` pattern (at least two keys), then the
///    `r,g,b[,a]` pattern (alpha defaults to `1.0`), then every property
///    that parses as a number, in declaration order. Keys match
///    case-insensitively.
/// 3. Arrays coerce element-wise.
/// 4. Any scalar becomes a one-element sequence.
pub fn read_float_array(json: &JsonValue) -> Vec<f32> {
    match json {
        JsonValue::Null => Vec::new(),
        JsonValue::Object(map) => read_object(map),
        JsonValue::Array(items) => items.iter().map(coerce_json).collect(),
        scalar => vec![coerce_json(scalar)],
    }
}

/// [`read_float_array`] rounded to the nearest integer, ties to even.
pub fn read_int_array(json: &JsonValue) -> Vec<i32> {
    read_float_array(json)
        .into_iter()
        .map(round_to_int)
        .collect()
}

fn read_object(map: &Map<String, JsonValue>) -> Vec<f32> {
    if let Some(vector) = read_vector_pattern(map) {
        return vector;
    }
    if let Some(color) = read_color_pattern(map) {
        return color;
    }
    map.values().filter_map(parse_property).collect()
}

fn read_vector_pattern(map: &Map<String, JsonValue>) -> Option<Vec<f32>> {
    let values: Vec<f32> = VECTOR_KEYS
        .iter()
        .map_while(|key| get_ignore_case(map, key))
        .map(coerce_json)
        .collect();
    (values.len() >= 2).then_some(values)
}

fn read_color_pattern(map: &Map<String, JsonValue>) -> Option<Vec<f32>> {
    let mut values: Vec<f32> = COLOR_KEYS
        .iter()
        .map_while(|key| get_ignore_case(map, key))
        .map(coerce_json)
        .collect();
    if values.len() == 3 {
        values.push(1.0);
    }
    (values.len() >= 3).then_some(values)
}

/// Case-insensitive property lookup; an exact match wins over a folded one.
pub(crate) fn get_ignore_case<'a>(
    map: &'a Map<String, JsonValue>,
    key: &str,
) -> Option<&'a JsonValue> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Fallback object reader: only properties whose text parses as a number.
fn parse_property(value: &JsonValue) -> Option<f32> {
    match value {
        JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
        JsonValue::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}

/// Coerce one JSON leaf. Never fails.
pub fn coerce_json(value: &JsonValue) -> f32 {
    match value {
        JsonValue::Number(n) => n.as_f64().map_or(0.0, |f| f as f32),
        JsonValue::String(s) => s.trim().parse::<f32>().unwrap_or(0.0),
        JsonValue::Bool(b) => f32::from(u8::from(*b)),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Native input
// ---------------------------------------------------------------------------

/// Flatten a native [`Value`] into a float sequence.
///
/// Known math structs flatten in canonical component order; sequences
/// coerce element-wise; scalars become a single element.
pub fn read_value_float_array(value: &Value) -> Vec<f32> {
    match value {
        Value::Null => Vec::new(),
        Value::Struct(_) => flatten_struct(value).unwrap_or_default(),
        Value::Seq(items) => read_float_iter(items),
        scalar => vec![coerce_value(scalar)],
    }
}

fn flatten_struct(value: &Value) -> Option<Vec<f32>> {
    if let Some(c) = value.struct_ref::<Color>() {
        return Some(vec![c.r, c.g, c.b, c.a]);
    }
    if let Some(v) = value.struct_ref::<Vector2>() {
        return Some(v.to_array());
    }
    if let Some(v) = value.struct_ref::<Vector3>() {
        return Some(v.to_array());
    }
    if let Some(v) = value.struct_ref::<Vector4>() {
        return Some(v.to_array());
    }
    if let Some(q) = value.struct_ref::<Quaternion>() {
        return Some(vec![q.x, q.y, q.z, q.w]);
    }
    value.struct_ref::<Bounds>().map(|b| {
        let mut out = b.center.to_array();
        out.extend(b.size.to_array());
        out
    })
}

/// A leaf that can be coerced to `f32` without failing.
pub trait NumericLeaf {
    fn to_f32_lossy(&self) -> f32;
}

impl NumericLeaf for Value {
    fn to_f32_lossy(&self) -> f32 {
        coerce_value(self)
    }
}

impl NumericLeaf for JsonValue {
    fn to_f32_lossy(&self) -> f32 {
        coerce_json(self)
    }
}

macro_rules! numeric_leaf {
    ($($ty:ty),*) => {$(
        impl NumericLeaf for $ty {
            #[allow(clippy::cast_lossless, clippy::cast_precision_loss)]
            fn to_f32_lossy(&self) -> f32 {
                *self as f32
            }
        }
    )*};
}

numeric_leaf!(f32, f64, i8, i16, i32, i64, u8, u16, u32, u64);

impl NumericLeaf for str {
    fn to_f32_lossy(&self) -> f32 {
        self.trim().parse().unwrap_or(0.0)
    }
}

impl NumericLeaf for String {
    fn to_f32_lossy(&self) -> f32 {
        self.as_str().to_f32_lossy()
    }
}

impl<T: NumericLeaf + ?Sized> NumericLeaf for &T {
    fn to_f32_lossy(&self) -> f32 {
        (**self).to_f32_lossy()
    }
}

/// Coerce any iterable of numeric leaves, in iteration order.
pub fn read_float_iter<I>(items: I) -> Vec<f32>
where
    I: IntoIterator,
    I::Item: NumericLeaf,
{
    items.into_iter().map(|item| item.to_f32_lossy()).collect()
}

fn coerce_value(value: &Value) -> f32 {
    match value {
        Value::Bool(b) => f32::from(u8::from(*b)),
        Value::Int(i) => *i as f32,
        Value::Float(f) => *f as f32,
        Value::String(s) => s.to_f32_lossy(),
        Value::Char(c) => c.to_digit(10).map_or(0.0, |d| d as f32),
        Value::Null | Value::Enum(_) | Value::Seq(_) | Value::Struct(_) => 0.0,
    }
}

pub(crate) fn round_to_int(f: f32) -> i32 {
    let r = f.round_ties_even();
    if r.is_nan() {
        0
    } else {
        // `as` saturates at the i32 bounds.
        r as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_unknown_shapes_are_empty() {
        assert!(read_float_array(&JsonValue::Null).is_empty());
        assert!(read_float_array(&json!({})).is_empty());
        assert!(read_value_float_array(&Value::Null).is_empty());
    }

    #[test]
    fn vector_pattern_stops_at_first_missing_key() {
        assert_eq!(read_float_array(&json!({"x": 1, "y": 2, "w": 9})), vec![1.0, 2.0]);
        assert_eq!(
            read_float_array(&json!({"X": 1, "Y": "2.5", "Z": 3, "W": 4})),
            vec![1.0, 2.5, 3.0, 4.0]
        );
    }

    #[test]
    fn single_vector_key_falls_through_to_numeric_fallback() {
        assert_eq!(read_float_array(&json!({"x": 7, "label": "n/a", "k": "4"})), vec![7.0, 4.0]);
    }

    #[test]
    fn color_pattern_defaults_alpha() {
        assert_eq!(read_float_array(&json!({"r": 1, "g": 0.5, "b": 0})), vec![1.0, 0.5, 0.0, 1.0]);
        assert_eq!(
            read_float_array(&json!({"r": 1, "g": 0.5, "b": 0, "a": 0.25})),
            vec![1.0, 0.5, 0.0, 0.25]
        );
    }

    #[test]
    fn array_leaves_coerce_without_failing() {
        assert_eq!(
            read_float_array(&json!([1, "2", true, null, "bad", [3]])),
            vec![1.0, 2.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn scalars_become_single_element() {
        assert_eq!(read_float_array(&json!(4.5)), vec![4.5]);
        assert_eq!(read_float_array(&json!("8")), vec![8.0]);
    }

    #[test]
    fn int_array_rounds_half_to_even() {
        assert_eq!(read_int_array(&json!([0.5, 1.5, 2.5, -0.5, 2.6])), vec![0, 2, 2, 0, 3]);
    }

    #[test]
    fn native_structs_flatten_in_component_order() {
        let q = Value::from_struct(Quaternion::new(0.1, 0.2, 0.3, 0.9));
        assert_eq!(read_value_float_array(&q), vec![0.1, 0.2, 0.3, 0.9]);

        let c = Value::from_struct(Color::RED);
        assert_eq!(read_value_float_array(&c), vec![1.0, 0.0, 0.0, 1.0]);

        let seq = Value::Seq(vec![Value::Int(1), Value::Float(2.5), Value::String("x".into())]);
        assert_eq!(read_value_float_array(&seq), vec![1.0, 2.5, 0.0]);
    }

    #[test]
    fn generic_iterables() {
        assert_eq!(read_float_iter([1u8, 2, 3]), vec![1.0, 2.0, 3.0]);
        assert_eq!(read_float_iter(vec!["1.5", "nope"]), vec![1.5, 0.0]);
        assert_eq!(read_float_iter(&[2.0f64, 4.0]), vec![2.0, 4.0]);
    }
}
