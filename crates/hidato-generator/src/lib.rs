//! Hidato puzzle generation.
//!
//! This crate turns a board size and a seed into a puzzle with exactly one
//! completion. The pipeline has four stages:
//!
//! - [`mask`]: optionally block a few cells to shape the board
//! - [`path`]: build a Hamiltonian path over the open cells, which becomes the
//!   solution
//! - clue reduction: starting from every value revealed, hide values one at a
//!   time while the [`UniquenessValidator`](hidato_solver::UniquenessValidator)
//!   still certifies uniqueness
//! - [`repair`]: when hiding a value makes the puzzle ambiguous, try blocking a
//!   cell where the competing completions diverge before revealing it again
//!
//! [`PuzzleGenerator`] runs the pipeline as an explicit state machine and
//! records what happened in [`GenerationMetrics`].
//!
//! # Examples
//!
//! ```
//! use hidato_generator::{Difficulty, GeneratorConfig, PuzzleGenerator};
//!
//! let config = GeneratorConfig::default()
//!     .with_size(6, 6)
//!     .with_difficulty(Difficulty::Easy)
//!     .with_seed(7);
//! let generator = PuzzleGenerator::new(config)?;
//! let puzzle = generator.generate()?;
//!
//! println!("{}", puzzle.grid);
//! assert!(puzzle.clues.contains(&1));
//! assert!(puzzle.clues.contains(&puzzle.max_value()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    config::{ConfigError, GeneratorConfig},
    difficulty::{Difficulty, UnknownOption},
    generator::{
        AbortReason, GeneratedPuzzle, GenerationError, GenerationState, PuzzleGenerator,
    },
    mask::{MaskMode, MaskTemplate},
    metrics::{GenerationMetrics, StageTimings},
    path::PathMode,
    seed::{PuzzleSeed, SeedError},
};

mod config;
mod difficulty;
mod generator;
pub mod mask;
mod metrics;
pub mod path;
pub mod repair;
mod seed;
