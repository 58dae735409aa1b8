//! Hidato solving and uniqueness certification.
//!
//! This crate decides how many completions a Hidato [`Puzzle`] has. It offers:
//!
//! - [`search`]: a time-budgeted backtracking search with a solution cap,
//!   configurable value direction and neighbour ordering
//! - [`UniquenessValidator`]: a staged validator returning a tri-state
//!   [`UniquenessDecision`] (unique, non-unique, inconclusive)
//! - [`Deadline`]: the single budget type threaded through every search stage
//!
//! # Examples
//!
//! ```
//! use hidato_core::{Adjacency, Grid};
//! use hidato_solver::{Puzzle, UniquenessDecision, UniquenessValidator, ValidatorConfig};
//! use rand::SeedableRng as _;
//!
//! let grid: Grid = "1 . 3 / 6 . 4".parse()?;
//! let puzzle = Puzzle::new(grid, Adjacency::Four)?;
//!
//! let mut validator = UniquenessValidator::new(ValidatorConfig::default());
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
//! let report = validator.validate(&puzzle, &mut rng);
//! assert_eq!(report.decision, UniquenessDecision::Unique);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    deadline::Deadline,
    puzzle::{Puzzle, PuzzleError, Solution},
    search::{Direction, SearchConfig, SearchOutcome, SearchStatus, search, solve},
    uniqueness::{
        DecisionMethod, InconclusivePolicy, UniquenessDecision, UniquenessReport,
        UniquenessValidator, UnknownPolicy, ValidatorConfig,
    },
};

mod deadline;
mod puzzle;
mod search;
pub mod signature;
mod uniqueness;
