//! # Rate-limit filter benchmarks
//!
//! A three-minute song analysed at 100 frames/s yields ~18 000 samples per
//! channel; filtering must stay far below a second per song.
//!
//! Run: `cargo bench --bench filter_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cantor_core::prelude::*;

/// Deterministic open/close chatter, one sample every 10 ms
fn chattering_curve(samples: usize) -> MotionCurve {
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    let pairs = (0..samples).map(|i| {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (i as f64 * 0.01, if state % 3 == 0 { 1.0 } else { 0.0 })
    });
    MotionCurve::from_pairs(pairs.collect::<Vec<_>>()).expect("valid curve")
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limit_filter");

    for samples in [1_000, 18_000, 100_000] {
        let curve = chattering_curve(samples);
        group.bench_with_input(BenchmarkId::new("apply_150ms", samples), &curve, |b, curve| {
            let filter = RateLimitFilter::from_millis(150);
            b.iter(|| black_box(filter.apply(curve.clone())))
        });
    }

    let curve = chattering_curve(18_000);
    group.bench_function("keyframes_18000", |b| {
        let filter = RateLimitFilter::from_millis(150);
        b.iter(|| black_box(filter.keyframes(&curve)))
    });

    group.finish();
}

fn bench_curve_construction(c: &mut Criterion) {
    let pairs: Vec<(f64, f64)> = (0..18_000).map(|i| (i as f64 * 0.01, (i % 7) as f64 / 6.0)).collect();

    c.bench_function("motion_curve_from_pairs_18000", |b| {
        b.iter(|| black_box(MotionCurve::from_pairs(pairs.iter().copied())))
    });
}

criterion_group!(benches, bench_filter, bench_curve_construction);
criterion_main!(benches);
