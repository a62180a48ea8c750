//! # Tick path benchmarks
//!
//! One tick interpolates every channel and dispatches one batch. At 100 Hz
//! the whole path has a 10 ms budget; these numbers should sit in the
//! microseconds.
//!
//! Run: `cargo bench --bench tick_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cantor_actuator::{ActuatorConfig, MockDriver};
use cantor_core::prelude::*;
use cantor_sync::SyncPlayer;

fn song_curve(samples: usize, phase: usize) -> MotionCurve {
    let pairs: Vec<(f64, f64)> = (0..samples)
        .map(|i| (i as f64 * 0.01, ((i + phase) % 40) as f64 / 40.0))
        .collect();
    MotionCurve::from_pairs(pairs).expect("valid curve")
}

fn bench_position_at(c: &mut Criterion) {
    let curve = song_curve(18_000, 0);

    c.bench_function("position_at_18000", |b| {
        let mut t = 0.0;
        b.iter(|| {
            t = (t + 0.0137) % 180.0;
            black_box(curve.position_at(black_box(t)))
        })
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_player_tick");

    for channels in [1usize, 3, 8] {
        let configs: Vec<ActuatorConfig> = (0..channels)
            .map(|i| ActuatorConfig::new(format!("servo{}", i + 1), i as u32))
            .collect();
        let driver = MockDriver::with_configs(&configs).expect("mock driver");
        let mut player = SyncPlayer::new(driver);

        let curves: ChannelMap<MotionCurve> = configs
            .iter()
            .enumerate()
            .map(|(i, config)| (config.channel_id.clone(), song_curve(18_000, i * 5)))
            .collect();
        player.load(curves).expect("curves load");
        player.play().expect("player plays");

        group.bench_with_input(BenchmarkId::from_parameter(channels), &channels, |b, _| {
            let mut t = 0.0;
            b.iter(|| {
                t = (t + 0.01) % 180.0;
                black_box(player.tick(t))
            })
        });

        black_box(player.driver().batches());
    }

    group.finish();
}

criterion_group!(benches, bench_position_at, bench_tick);
criterion_main!(benches);
