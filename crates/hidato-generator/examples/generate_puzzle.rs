//! Example generating Hidato puzzles from the command line.
//!
//! This example shows how to:
//! - Build a `GeneratorConfig` from command-line options
//! - Generate a puzzle and print it with its solution and seed
//! - Generate many puzzles in parallel and keep the one with the fewest clues
//!
//! # Usage
//!
//! ```sh
//! cargo run --example generate_puzzle
//! ```
//!
//! Pick the board, neighbour rule, difficulty, and path mode:
//!
//! ```sh
//! cargo run --example generate_puzzle -- --rows 8 --cols 8 --adjacency 8 --difficulty hard --path-mode random_walk_v2
//! ```
//!
//! Reproduce a run:
//!
//! ```sh
//! cargo run --example generate_puzzle -- --seed 42
//! ```
//!
//! Sample several seeds and keep the sparsest puzzle:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example generate_puzzle -- --tries 32
//! ```

use std::process;

use clap::Parser;
use hidato_core::Adjacency;
use hidato_generator::{
    Difficulty, GeneratedPuzzle, GeneratorConfig, MaskMode, PathMode, PuzzleGenerator,
};
use hidato_solver::InconclusivePolicy;
use rayon::prelude::*;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Board rows.
    #[arg(long, default_value_t = 7)]
    rows: usize,

    /// Board columns.
    #[arg(long, default_value_t = 7)]
    cols: usize,

    /// Neighbour rule (4 or 8).
    #[arg(long, default_value = "4")]
    adjacency: Adjacency,

    /// Difficulty tier (easy, medium, hard, expert).
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Path mode (serpentine, backbite_v1, random_walk_v2).
    #[arg(long, default_value = "backbite_v1")]
    path_mode: PathMode,

    /// Mask source (auto, template, procedural).
    #[arg(long, default_value = "auto")]
    mask_mode: MaskMode,

    /// Disable blocked-cell masks.
    #[arg(long)]
    no_mask: bool,

    /// Accept partial paths covering at least this fraction of the board.
    #[arg(long, value_name = "RATIO")]
    allow_partial: Option<f64>,

    /// How inconclusive uniqueness answers are treated (conservative, aggressive).
    #[arg(long, default_value = "conservative")]
    policy: InconclusivePolicy,

    /// Seed of the first try; random if omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of consecutive seeds to try.
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    tries: u64,
}

fn main() {
    better_panic::install();
    env_logger::init();

    let args = Args::parse();
    if args.tries == 0 {
        eprintln!("--tries must be at least 1.");
        process::exit(1);
    }

    let mut config = GeneratorConfig::default()
        .with_size(args.rows, args.cols)
        .with_adjacency(args.adjacency)
        .with_difficulty(args.difficulty)
        .with_path_mode(args.path_mode)
        .with_mask(!args.no_mask);
    config.mask_mode = args.mask_mode;
    config.inconclusive_policy = args.policy;
    if let Some(ratio) = args.allow_partial {
        config = config.with_partial_paths(ratio);
    }

    let generator = match PuzzleGenerator::new(config) {
        Ok(generator) => generator,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            process::exit(2);
        }
    };

    let first = args.seed.unwrap_or_else(rand::random);
    let best = (0..args.tries)
        .into_par_iter()
        .filter_map(|i| {
            let config = generator.config().clone().with_seed(first.wrapping_add(i));
            PuzzleGenerator::new(config).ok()?.generate().ok()
        })
        .min_by_key(|puzzle| (puzzle.clues.len(), puzzle.seed.to_string()));

    match best {
        Some(puzzle) => print_puzzle(&puzzle, args.tries),
        None => {
            eprintln!(
                "could not generate a valid puzzle within the configured budget; try a different seed or relax constraints"
            );
            process::exit(1);
        }
    }
}

fn print_puzzle(puzzle: &GeneratedPuzzle, tries: u64) {
    let metrics = &puzzle.metrics;

    println!("Seed:");
    println!("  {}", puzzle.seed);
    println!();

    println!("Problem:");
    for line in puzzle.grid.to_string().lines() {
        println!("  {line}");
    }
    println!();
    println!("Solution:");
    for line in puzzle.solution_grid().to_string().lines() {
        println!("  {line}");
    }
    println!();

    println!("Stats:");
    if tries > 1 {
        println!("  tries: {tries}");
    }
    println!("  values: {}", puzzle.max_value());
    println!("  clues: {}", puzzle.clues.len());
    match metrics.mask_pattern {
        Some(pattern) => println!(
            "  mask: {pattern} (density {:.3}, {} attempts)",
            metrics.mask_density, metrics.mask_attempts
        ),
        None => println!("  mask: none ({} attempts)", metrics.mask_attempts),
    }
    println!(
        "  path: {} ({} builds, coverage {:.3})",
        metrics.path_mode, metrics.path_builds, metrics.path_coverage
    );
    if let (Some(decision), Some(method)) = (metrics.uniqueness_decision, metrics.uniqueness_method) {
        println!("  uniqueness: {decision} via {method}");
    }
    println!(
        "  validations: {} ({} inconclusive, {} memo hits)",
        metrics.validations, metrics.inconclusive, metrics.memo_hits
    );
    println!(
        "  repairs: {} blocks applied, {} clues reinstated",
        metrics.repairs_applied, metrics.clues_reinstated
    );
    println!("  total: {} ms", metrics.timings.total_ms);
}
