//! Benchmarks for vessel-unroll operations.
//!
//! Run with: cargo bench -p vessel-unroll

use std::f64::consts::TAU;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nalgebra::{Point3, Vector3};
use vessel_unroll::{Aggregate, UnrollParams, UnrolledMap, gray_image, rgb_image, unroll_points};

/// Wavy cylinder sampled with `per_ring` points per unit of height.
fn create_surface(radius: f64, length: usize, per_ring: usize) -> Vec<Point3<f64>> {
    let mut points = Vec::with_capacity((length + 1) * per_ring);
    for z in 0..=length {
        for s in 0..per_ring {
            let t = TAU * s as f64 / per_ring as f64;
            let r = radius + 0.5 * (3.0 * t).sin() * (z as f64 * 0.2).cos();
            points.push(Point3::new(r * t.cos(), r * t.sin(), z as f64));
        }
    }
    points
}

fn create_map(radius: f64, length: usize, per_ring: usize) -> UnrolledMap {
    let surface = create_surface(radius, length, per_ring);
    let points = unroll_points(&surface, &Point3::origin(), &Vector3::z()).expect("axis");
    let relief = points.iter().map(|p| p.radius).collect();
    UnrolledMap::new(points, relief).expect("map")
}

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("unrolled_map_new");

    for length in [60, 120, 240] {
        let surface = create_surface(12.0, length, 128);
        group.throughput(Throughput::Elements(surface.len() as u64));
        group.bench_with_input(BenchmarkId::new("length", length), &surface, |b, surface| {
            b.iter(|| {
                let points = unroll_points(black_box(surface), &Point3::origin(), &Vector3::z())
                    .expect("axis");
                let relief = points.iter().map(|p| p.radius).collect();
                UnrolledMap::new(points, relief)
            })
        });
    }

    group.finish();
}

fn bench_images(c: &mut Criterion) {
    let map = create_map(12.0, 120, 64);

    let mut group = c.benchmark_group("normalized_image");
    for kind in [Aggregate::Mean, Aggregate::Median] {
        group.bench_with_input(BenchmarkId::new("fixed_2", kind), &kind, |b, &kind| {
            b.iter(|| map.normalized_image(black_box(2), kind))
        });
    }
    group.bench_function("multiscale", |b| {
        b.iter(|| map.normalized_image_multiscale(black_box(&UnrollParams::default())))
    });
    group.finish();

    let image = map
        .relief_image(&UnrollParams::default())
        .expect("relief image");
    c.bench_function("gray_image", |b| b.iter(|| gray_image(black_box(&image))));
    c.bench_function("rgb_image", |b| b.iter(|| rgb_image(black_box(&image))));
}

criterion_group!(benches, bench_construct, bench_images);
criterion_main!(benches);
