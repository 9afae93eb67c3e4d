//! Conversion façade throughput.
//!
//! Measures encoding and decoding of the built-in math types and of long
//! primitive lists, the two shapes that dominate real save files.
//!
//! Run with: `cargo bench --bench convert_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use savekit_convert::prelude::*;

fn bench_struct_conversion(c: &mut Criterion) {
    let registry = ConverterRegistry::with_builtins();
    let converters = registry.converters();
    let mut group = c.benchmark_group("struct_conversion");

    let bounds = Bounds::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
    group.bench_function("bounds_to_json", |b| {
        b.iter(|| converters.to_json(black_box(bounds)).ok())
    });

    let canonical = json!([0.1, 0.2, 0.3, 0.9]);
    group.bench_function("quaternion_from_array", |b| {
        b.iter(|| converters.from_json::<Quaternion>(black_box(&canonical)).ok())
    });

    let keyed = json!({"x": 0.1, "y": 0.2, "z": 0.3, "w": 0.9});
    group.bench_function("quaternion_from_object", |b| {
        b.iter(|| converters.from_json::<Quaternion>(black_box(&keyed)).ok())
    });

    group.finish();
}

fn bench_list_conversion(c: &mut Criterion) {
    let registry = ConverterRegistry::with_builtins();
    let converters = registry.converters();
    let mut group = c.benchmark_group("list_conversion");

    for len in [16usize, 256, 4096] {
        let values: Vec<i32> = (0..len as i32).collect();
        let json = converters.to_json(values.clone()).unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("encode_i32", len), &values, |b, values| {
            b.iter(|| converters.to_json(values.clone()).ok())
        });
        group.bench_with_input(BenchmarkId::new("decode_i32", len), &json, |b, json| {
            b.iter(|| converters.from_json::<Vec<i32>>(json).ok())
        });

        let path: Vec<Vector3> = (0..len).map(|i| Vector3::new(i as f32, 0.5, -1.0)).collect();
        group.bench_with_input(BenchmarkId::new("encode_vector3", len), &path, |b, path| {
            b.iter(|| converters.to_json(path.clone()).ok())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_struct_conversion, bench_list_conversion);
criterion_main!(benches);
