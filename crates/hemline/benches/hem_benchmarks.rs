//! Benchmarks for the hem generation stages.
//!
//! Run with: cargo bench -p hemline
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p hemline -- --save-baseline main
//! 2. After changes: cargo bench -p hemline -- --baseline main

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hemline::{
    Boundaries, BSplineSampler, CurveSampler, FoldParameters, FoldVariant, GarmentBuilder,
    GarmentKind, Topology, generate, offset_curve, stitch,
};

// =============================================================================
// Fold Generation
// =============================================================================

fn bench_fold_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("FoldGeneration");

    for variant in [
        FoldVariant::Cartesian,
        FoldVariant::PolarArc,
        FoldVariant::FullCircle,
    ] {
        let params = FoldParameters::skirt().with_num_folds(100).with_seed(1);
        group.bench_with_input(
            BenchmarkId::new("generate", variant.as_str()),
            &params,
            |b, params| b.iter(|| generate(black_box(params), variant)),
        );
    }

    group.finish();
}

// =============================================================================
// Sampling
// =============================================================================

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sampling");
    let pattern = generate(&FoldParameters::curtain().with_seed(1), FoldVariant::Cartesian)
        .expect("curtain preset is valid");

    for step in [0.01, 0.001, 0.0005] {
        let samples = (1.0 / step) as u64 + 1;
        group.throughput(Throughput::Elements(samples));
        group.bench_with_input(BenchmarkId::new("bspline", samples), &step, |b, &step| {
            b.iter(|| BSplineSampler.sample_clamped(black_box(&pattern.control_points), 3, step))
        });
    }

    group.finish();
}

// =============================================================================
// Offset and Stitch
// =============================================================================

fn bench_offset_and_stitch(c: &mut Criterion) {
    let mut group = c.benchmark_group("OffsetStitch");
    let pattern = generate(&FoldParameters::curtain().with_seed(1), FoldVariant::Cartesian)
        .expect("curtain preset is valid");
    let curve = BSplineSampler
        .sample_clamped(&pattern.control_points, 3, 0.0005)
        .expect("curve samples");

    group.throughput(Throughput::Elements(curve.len() as u64));
    group.bench_function("offset_2001", |b| {
        b.iter(|| offset_curve(black_box(curve.points()), 0.5))
    });

    let sides = offset_curve(curve.points(), 0.5).expect("offset succeeds");
    let boundaries = Boundaries::extruded(&sides, 5.0).expect("boundaries match");
    group.bench_function("stitch_2001", |b| {
        b.iter(|| stitch(black_box(&boundaries), Topology::OpenStrip))
    });

    group.finish();
}

// =============================================================================
// Full Pipeline
// =============================================================================

fn bench_garments(c: &mut Criterion) {
    let mut group = c.benchmark_group("Garment");
    group.sample_size(20);

    for kind in GarmentKind::ALL {
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| GarmentBuilder::new(kind).seed(7).sampling_step(0.002).build())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fold_generation,
    bench_sampling,
    bench_offset_and_stitch,
    bench_garments,
);

criterion_main!(benches);
