//! Property tests for the conversion engine.
//!
//! Covers the round-trip law of every built-in converter, permissive
//! decoding of equivalent input shapes, and the recursion of the support
//! predicate through arrays and lists.

use proptest::prelude::*;
use savekit_convert::prelude::*;
use serde_json::json;

const EPS: f32 = 1e-3;

fn component() -> impl Strategy<Value = f32> {
    -1.0e4f32..1.0e4f32
}

fn vector3() -> impl Strategy<Value = Vector3> {
    (component(), component(), component()).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

#[derive(Debug, Clone, PartialEq)]
struct Unregistered;
savekit_convert::save_struct!(Unregistered);

/// Leaf types mixing supported and unsupported kinds.
#[derive(Debug, Clone, Copy)]
enum Leaf {
    Int,
    Text,
    Color,
    Unregistered,
}

fn leaf_type(leaf: Leaf) -> FieldType {
    match leaf {
        Leaf::Int => FieldType::of::<i32>(),
        Leaf::Text => FieldType::of::<String>(),
        Leaf::Color => FieldType::of::<Color>(),
        Leaf::Unregistered => FieldType::of::<Unregistered>(),
    }
}

fn wrap(ty: FieldType, shape: &[bool]) -> FieldType {
    shape.iter().fold(ty, |inner, is_list| {
        if *is_list {
            FieldType::List(Box::new(inner))
        } else {
            FieldType::Array(Box::new(inner))
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn vector2_round_trip(x in component(), y in component()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let v = Vector2::new(x, y);
        let back: Vector2 = c.from_json(&c.to_json(v).unwrap()).unwrap();
        prop_assert!(back.approx_eq(v, EPS), "{back:?} != {v:?}");
    }

    #[test]
    fn vector3_round_trip(v in vector3()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let back: Vector3 = c.from_json(&c.to_json(v).unwrap()).unwrap();
        prop_assert!(back.approx_eq(v, EPS), "{back:?} != {v:?}");
    }

    #[test]
    fn vector4_round_trip(x in component(), y in component(), z in component(), w in component()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let v = Vector4::new(x, y, z, w);
        let back: Vector4 = c.from_json(&c.to_json(v).unwrap()).unwrap();
        prop_assert!(back.approx_eq(v, EPS));
    }

    #[test]
    fn quaternion_round_trip(x in -1.0f32..1.0, y in -1.0f32..1.0, z in -1.0f32..1.0, w in -1.0f32..1.0) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let q = Quaternion::new(x, y, z, w);
        let back: Quaternion = c.from_json(&c.to_json(q).unwrap()).unwrap();
        prop_assert!(back.approx_eq(q, EPS));
    }

    #[test]
    fn color_round_trip(r in 0.0f32..1.0, g in 0.0f32..1.0, b in 0.0f32..1.0, a in 0.0f32..1.0) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let color = Color::new(r, g, b, a);
        let back: Color = c.from_json(&c.to_json(color).unwrap()).unwrap();
        prop_assert!(back.approx_eq(color, EPS));
    }

    #[test]
    fn bounds_round_trip(center in vector3(), size in vector3()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let b = Bounds::new(center, size);
        let back: Bounds = c.from_json(&c.to_json(b).unwrap()).unwrap();
        prop_assert!(back.approx_eq(&b, EPS));
    }

    #[test]
    fn quaternion_array_and_object_decode_alike(x in component(), y in component(), z in component(), w in component()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let from_array: Quaternion = c.from_json(&json!([x, y, z, w])).unwrap();
        let from_object: Quaternion = c.from_json(&json!({"x": x, "y": y, "z": z, "w": w})).unwrap();
        prop_assert_eq!(from_array, from_object);
    }

    #[test]
    fn bounds_center_size_matches_min_max(center in vector3(), size in vector3()) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let size = size.abs();
        let b = Bounds::new(center, size);
        let (min, max) = (b.min(), b.max());
        let via_min_max: Bounds = c.from_json(&json!({
            "min": [min.x, min.y, min.z],
            "max": [max.x, max.y, max.z],
        })).unwrap();
        prop_assert!(via_min_max.approx_eq(&b, 1e-2), "{via_min_max:?} vs {b:?}");
    }

    #[test]
    fn container_support_matches_element_support(
        leaf in prop_oneof![Just(Leaf::Int), Just(Leaf::Text), Just(Leaf::Color), Just(Leaf::Unregistered)],
        shape in prop::collection::vec(any::<bool>(), 1..5),
    ) {
        let registry = ConverterRegistry::with_builtins();
        let elem = leaf_type(leaf);
        let wrapped = wrap(elem.clone(), &shape);
        prop_assert_eq!(registry.is_supported(&wrapped), registry.is_supported(&elem));
    }

    #[test]
    fn integer_lists_round_trip(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let registry = ConverterRegistry::with_builtins();
        let c = registry.converters();
        let back: Vec<i32> = c.from_json(&c.to_json(values.clone()).unwrap()).unwrap();
        prop_assert_eq!(back, values);
    }

    #[test]
    fn numeric_reader_never_panics(text in ".*", n in any::<f64>()) {
        let _ = read_float_array(&json!(text));
        let _ = read_float_array(&json!([text, n, null, {"x": n}]));
        let _ = read_int_array(&json!({"x": text, "y": n}));
    }
}
