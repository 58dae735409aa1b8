//! Benchmarks for Hidato puzzle generation.
//!
//! # Benchmarks
//!
//! - **`generator_backbite`**: Full generation on a 7x7 four-neighbour board
//!   with masks, `backbite_v1` paths, and structural repair enabled.
//! - **`generator_random_walk_eight`**: Full generation on a 7x7
//!   eight-neighbour board with `random_walk_v2` paths.
//! - **`path_<mode>`**: Path construction alone on an open 9x9 board.
//!
//! # Test Data
//!
//! Uses three fixed seeds so every run measures the same puzzles:
//!
//! - **`seed_0`**: `c1d44bd6afaf8af64f126546884e19298acbdc33c3924a28136715de946ef3f1`
//! - **`seed_1`**: `a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3`
//! - **`seed_2`**: `1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef`
//!
//! # Running
//!
//! ```sh
//! cargo bench --bench generator
//! ```

use std::{hint, str::FromStr as _, time::Duration};

use criterion::{
    BatchSize, BenchmarkId, Criterion, PlottingBackend, criterion_group, criterion_main,
};
use hidato_core::{Adjacency, Grid};
use hidato_generator::{
    GeneratorConfig, PathMode, PuzzleGenerator, PuzzleSeed,
    path::{PathParams, build_path},
};
use hidato_solver::Deadline;

const SEEDS: [&str; 3] = [
    "c1d44bd6afaf8af64f126546884e19298acbdc33c3924a28136715de946ef3f1",
    "a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3",
    "1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
];

fn bench_generation(c: &mut Criterion, name: &str, config: GeneratorConfig) {
    let generator = PuzzleGenerator::new(config).unwrap();

    for (i, seed) in SEEDS.into_iter().enumerate() {
        let seed = PuzzleSeed::from_str(seed).unwrap();
        c.bench_with_input(BenchmarkId::new(name, format!("seed_{i}")), &seed, |b, seed| {
            b.iter_batched(
                || hint::black_box(*seed),
                |seed| generator.generate_with_seed(seed),
                BatchSize::SmallInput,
            );
        });
    }
}

fn bench_generator_backbite(c: &mut Criterion) {
    let config = GeneratorConfig::default().with_path_mode(PathMode::BackbiteV1);
    bench_generation(c, "generator_backbite", config);
}

fn bench_generator_random_walk_eight(c: &mut Criterion) {
    let config = GeneratorConfig::default()
        .with_adjacency(Adjacency::Eight)
        .with_path_mode(PathMode::RandomWalkV2);
    bench_generation(c, "generator_random_walk_eight", config);
}

fn bench_path_modes(c: &mut Criterion) {
    let grid = Grid::new(9, 9).unwrap();
    let params = PathParams::default();

    for mode in PathMode::ALL {
        for (i, seed) in SEEDS.into_iter().enumerate() {
            let seed = PuzzleSeed::from_str(seed).unwrap();
            c.bench_with_input(
                BenchmarkId::new(format!("path_{mode}"), format!("seed_{i}")),
                &seed,
                |b, seed| {
                    b.iter_batched(
                        || hint::black_box(*seed).rng(),
                        |mut rng| {
                            build_path(&grid, Adjacency::Four, mode, &params, Deadline::never(), &mut rng)
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .plotting_backend(PlottingBackend::Plotters)
        .measurement_time(Duration::from_secs(10));
    targets = bench_generator_backbite, bench_generator_random_walk_eight, bench_path_modes
);
criterion_main!(benches);
