use alchemy_core::{AlchemyConfig, AlchemyEngine, FrameSnapshot};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::time::{Duration, Instant};

fn scattered_frames(tokens: u32, frames: usize, seed: u64) -> Vec<FrameSnapshot> {
    let config = AlchemyConfig::default();
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut positions: Vec<(f32, f32)> = (0..tokens)
        .map(|_| {
            (
                rng.random_range(0.0..config.surface_width),
                rng.random_range(0.0..config.surface_height),
            )
        })
        .collect();
    (0..frames)
        .map(|_| {
            let mut snapshot = FrameSnapshot::new();
            for (id, pos) in positions.iter_mut().enumerate() {
                pos.0 = (pos.0 + rng.random_range(-15.0..15.0)).clamp(0.0, config.surface_width);
                pos.1 = (pos.1 + rng.random_range(-15.0..15.0)).clamp(0.0, config.surface_height);
                snapshot = snapshot.with(id as u32, pos.0, pos.1);
            }
            snapshot
        })
        .collect()
}

fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_step");
    // Allow env overrides for quick local runs.
    let frames: usize = std::env::var("ALCHEMY_BENCH_FRAMES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(120);
    group.measurement_time(Duration::from_secs(5));

    for tokens in [8_u32, 32, 96] {
        let script = scattered_frames(tokens, frames, 0xBEEF);
        group.bench_function(format!("frames{frames}_tokens{tokens}"), |b| {
            b.iter_batched(
                || AlchemyEngine::new(AlchemyConfig::default()).expect("engine"),
                |mut engine| {
                    let start = Instant::now();
                    for (i, snapshot) in script.iter().enumerate() {
                        let now = start + Duration::from_millis(33 * i as u64);
                        std::hint::black_box(engine.step(snapshot, now));
                    }
                    engine
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frames);
criterion_main!(benches);
