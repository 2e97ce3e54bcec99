//! RL Algorithm Benchmarks
//!
//! Benchmarks for the capacity Q-learning pipeline:
//! - State space enumeration
//! - Action graph construction (pairwise near predicate)
//! - Training episodes
//! - Convergence metric evaluation
//!
//! ## Hot Paths Identified
//! 1. Adjacency::build() - O(states^2) near checks
//! 2. QLearningEngine::train_episode() - random walk with Q updates
//! 3. QLearningEngine::mean_steps_to_near_goal() - runs after every episode

use capq_core::{build_states, Adjacency, GraphOptions};
use capq_rl::{LearningParams, QLearningEngine};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn pool(units_per_kind: u32) -> (Vec<&'static str>, Vec<u32>) {
    (vec!["M1", "M2", "M3", "M4"], vec![units_per_kind; 4])
}

fn bench_state_space(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_space");

    for units in [1u32, 2, 3] {
        let (names, max_units) = pool(units);
        group.throughput(Throughput::Elements((1u64 << (units * 4)) - 1));
        group.bench_with_input(BenchmarkId::new("build", units * 4), &units, |b, _| {
            b.iter(|| build_states(black_box(&names), black_box(&max_units)).unwrap());
        });
    }

    group.finish();
}

fn bench_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjacency");
    group.sample_size(20);

    for units in [1u32, 2, 3] {
        let (names, max_units) = pool(units);
        let space = build_states(&names, &max_units).unwrap();
        group.bench_with_input(BenchmarkId::new("build", space.len()), &space, |b, space| {
            b.iter(|| Adjacency::build(black_box(space), GraphOptions::default()));
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10);

    let (names, max_units) = pool(2);
    let space = build_states(&names, &max_units).unwrap();
    let adjacency = Adjacency::build(&space, GraphOptions::default());
    let params = LearningParams {
        episodes: 10,
        ..Default::default()
    };

    group.bench_function("episodes_10", |b| {
        b.iter(|| {
            let mut engine =
                QLearningEngine::new(&space, &adjacency, 10, params.clone()).unwrap();
            let mut rng = StdRng::seed_from_u64(7);
            engine.run_with_rng(&mut rng).unwrap()
        });
    });

    let engine = QLearningEngine::new(&space, &adjacency, 10, params).unwrap();
    group.bench_function("mean_steps_to_near_goal", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| engine.mean_steps_to_near_goal(&mut rng).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_state_space, bench_adjacency, bench_training);
criterion_main!(benches);
