//! The generation pipeline.
//!
//! One attempt runs through an explicit state machine:
//!
//! ```text
//! Init -> MaskApplied -> PathBuilt -> ClueReducing -> Validating <-> Repairing
//!                                                        |
//!                                                        v
//!                                                     Accepted
//! ```
//!
//! Any non-terminal state may move to `Aborted(reason)`. A single seeded
//! generator is threaded through every stage, so the same seed and
//! configuration reproduce the same puzzle as long as no budget expires.

use std::time::Instant;

use hidato_core::{Adjacency, Grid, Position};
use hidato_solver::{
    Deadline, Puzzle, PuzzleError, Solution, UniquenessReport, UniquenessValidator,
};
use log::{debug, info, warn};
use rand::seq::SliceRandom as _;
use rand_pcg::Pcg64;

use crate::{
    ConfigError, GenerationMetrics, GeneratorConfig, PuzzleSeed,
    mask::{self, MaskOutcome},
    path::{self, PathBuildResult, PathReason},
    repair::StructuralRepair,
};

/// Where a generation attempt stands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// Nothing done yet.
    #[display("init")]
    Init,
    /// The board shape, with or without a mask, is fixed.
    #[display("mask_applied")]
    MaskApplied,
    /// A path and the full clue set exist.
    #[display("path_built")]
    PathBuilt,
    /// Clues are being removed.
    #[display("clue_reducing")]
    ClueReducing,
    /// A candidate puzzle is being validated.
    #[display("validating")]
    Validating,
    /// An ambiguous candidate is being repaired.
    #[display("repairing")]
    Repairing,
    /// The puzzle was accepted.
    #[display("accepted")]
    Accepted,
    /// The attempt was abandoned.
    #[display("aborted({_0})")]
    Aborted(AbortReason),
}

impl GenerationState {
    /// Returns `true` for `Accepted` and `Aborted`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Aborted(_))
    }

    /// Returns `true` if the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use GenerationState as S;
        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (_, S::Aborted(_))
            | (S::Init, S::MaskApplied)
            | (S::MaskApplied, S::PathBuilt)
            | (S::PathBuilt, S::ClueReducing)
            | (S::ClueReducing | S::Repairing, S::Validating)
            | (S::Validating, S::Repairing | S::Accepted) => true,
            (current, next) => current == next,
        }
    }
}

/// Why an attempt was abandoned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// No path mode produced an acceptable path, even without a mask.
    #[display("no acceptable path ({reason})")]
    PathUnavailable {
        /// How the last build ended.
        reason: PathReason,
    },
    /// The final puzzle failed its own consistency check.
    #[display("self check failed")]
    SelfCheckFailed,
}

/// Error returned by [`PuzzleGenerator`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GenerationError {
    /// The configuration is invalid.
    #[display("invalid configuration: {_0}")]
    InvalidConfig(#[from] ConfigError),
    /// The attempt was abandoned.
    #[display(
        "could not generate a valid puzzle within the configured budget; try a different seed or relax constraints"
    )]
    Aborted(#[error(not(source))] AbortReason),
}

/// A certified puzzle.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneratedPuzzle {
    /// The board with its givens and blocked cells.
    pub grid: Grid,
    /// Neighbour rule.
    pub adjacency: Adjacency,
    /// Revealed values in ascending order.
    pub clues: Vec<u32>,
    /// The unique solution; the cell of value `v` is at index `v - 1`.
    pub path: Vec<Position>,
    /// Seed that reproduces the puzzle.
    pub seed: PuzzleSeed,
    /// Record of the run.
    pub metrics: GenerationMetrics,
}

impl GeneratedPuzzle {
    /// Returns the puzzle for solving.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError`] if `grid` was modified into an invalid puzzle.
    pub fn puzzle(&self) -> Result<Puzzle, PuzzleError> {
        Puzzle::new(self.grid.clone(), self.adjacency)
    }

    /// Returns the solution.
    #[must_use]
    pub fn solution(&self) -> Solution {
        Solution::new(self.path.clone())
    }

    /// Returns the board with every open cell filled in.
    #[must_use]
    pub fn solution_grid(&self) -> Grid {
        self.solution().fill(&self.grid)
    }

    /// Returns the largest value, which is also the number of open cells.
    #[must_use]
    pub fn max_value(&self) -> u32 {
        u32::try_from(self.path.len()).unwrap_or(u32::MAX)
    }
}

/// Generates certified Hidato puzzles.
///
/// # Examples
///
/// ```
/// use hidato_generator::{GeneratorConfig, PathMode, PuzzleGenerator};
///
/// let config = GeneratorConfig::default()
///     .with_size(5, 5)
///     .with_path_mode(PathMode::Serpentine)
///     .with_mask(false)
///     .with_seed(42);
/// let generator = PuzzleGenerator::new(config)?;
/// let puzzle = generator.generate()?;
/// assert_eq!(puzzle.path.len(), 25);
/// assert!(puzzle.puzzle()?.is_solution(&puzzle.solution()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PuzzleGenerator {
    config: GeneratorConfig,
}

impl PuzzleGenerator {
    /// Creates a generator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a puzzle from the configured seed.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Aborted`] if no acceptable puzzle was found.
    pub fn generate(&self) -> Result<GeneratedPuzzle, GenerationError> {
        self.generate_with_seed(PuzzleSeed::from_u64(self.config.seed))
    }

    /// Generates a puzzle from `seed`, ignoring the configured seed.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Aborted`] if no acceptable puzzle was found.
    pub fn generate_with_seed(&self, seed: PuzzleSeed) -> Result<GeneratedPuzzle, GenerationError> {
        Attempt::new(&self.config, seed).run()
    }
}

struct Attempt<'a> {
    config: &'a GeneratorConfig,
    seed: PuzzleSeed,
    rng: Pcg64,
    state: GenerationState,
    metrics: GenerationMetrics,
}

impl<'a> Attempt<'a> {
    fn new(config: &'a GeneratorConfig, seed: PuzzleSeed) -> Self {
        let mut metrics = GenerationMetrics::default();
        metrics.states.push(GenerationState::Init);
        Self {
            config,
            seed,
            rng: seed.rng(),
            state: GenerationState::Init,
            metrics,
        }
    }

    fn advance(&mut self, next: GenerationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {next}",
            self.state
        );
        if self.state != next {
            debug!("generation: {} -> {next}", self.state);
            self.metrics.states.push(next);
            self.state = next;
        }
    }

    fn abort(&mut self, reason: AbortReason) -> GenerationError {
        warn!("generation aborted: {reason}");
        self.advance(GenerationState::Aborted(reason));
        GenerationError::Aborted(reason)
    }

    fn run(mut self) -> Result<GeneratedPuzzle, GenerationError> {
        let started = Instant::now();
        let board = self.config.board()?;

        let mask_started = Instant::now();
        let outcome = mask::generate_mask(
            &board,
            self.config.adjacency,
            &self.config.mask_settings(),
            self.config.difficulty,
            &mut self.rng,
        );
        self.metrics.record_mask(&outcome);
        self.metrics.timings.mask_ms = elapsed_ms(mask_started);
        self.advance(GenerationState::MaskApplied);

        let (shape, path) = self.build_path(&board, &outcome)?;
        let Ok(full) = Puzzle::from_solution(&shape, self.config.adjacency, &path, 1..=path_len(&path))
        else {
            return Err(self.abort(AbortReason::SelfCheckFailed));
        };
        self.advance(GenerationState::PathBuilt);

        let (puzzle, path, report) = self.reduce_clues(full, path);
        if !puzzle.is_solution(&path) || !self.config.inconclusive_policy.accepts(report.decision) {
            return Err(self.abort(AbortReason::SelfCheckFailed));
        }
        self.advance(GenerationState::Accepted);

        let mut clues = puzzle.clues().collect::<Vec<_>>();
        clues.sort_unstable();
        self.metrics.clue_count = clues.len();
        self.metrics.max_value = puzzle.max_value();
        self.metrics.uniqueness_decision = Some(report.decision);
        self.metrics.uniqueness_method = Some(report.method);
        self.metrics.timings.total_ms = elapsed_ms(started);
        info!(
            "generated {}x{} puzzle: values={}, clues={}, path={}, repairs={}",
            shape.rows(),
            shape.cols(),
            puzzle.max_value(),
            clues.len(),
            self.metrics.path_mode,
            self.metrics.repairs_applied
        );
        Ok(GeneratedPuzzle {
            grid: puzzle.grid().clone(),
            adjacency: self.config.adjacency,
            clues,
            path: path.positions().to_vec(),
            seed: self.seed,
            metrics: self.metrics,
        })
    }

    /// Builds a path over the masked board, falling back to other modes and
    /// then to the unmasked board.
    ///
    /// Returns the final board shape (with uncovered cells blocked) and the path.
    fn build_path(
        &mut self,
        board: &Grid,
        outcome: &MaskOutcome,
    ) -> Result<(Grid, Solution), GenerationError> {
        let masked = outcome.mask.as_ref().map(|mask| mask.apply(board));
        let mut last = PathReason::ExhaustedRestarts;
        for (shape, is_masked) in masked.iter().map(|g| (g, true)).chain([(board, false)]) {
            if !is_masked && masked.is_some() {
                warn!("path: no mode covered the masked board; retrying without the mask");
                self.metrics.clear_mask();
            }
            match self.try_modes(shape) {
                Ok(result) => {
                    let uncovered = result.uncovered(shape).collect::<Vec<_>>();
                    self.metrics.uncovered_blocked = uncovered.len();
                    let shape = shape.with_blocked(uncovered);
                    return Ok((shape, result.solution()));
                }
                Err(reason) => last = reason,
            }
        }
        Err(self.abort(AbortReason::PathUnavailable { reason: last }))
    }

    fn try_modes(&mut self, shape: &Grid) -> Result<PathBuildResult, PathReason> {
        let params = self.config.path_params();
        let modes = if self.config.path_mode_fallback {
            self.config.path_mode.with_fallbacks().collect::<Vec<_>>()
        } else {
            vec![self.config.path_mode]
        };
        let mut last = PathReason::ExhaustedRestarts;
        for mode in modes {
            let mut result = path::build_path(
                shape,
                self.config.adjacency,
                mode,
                &params,
                Deadline::never(),
                &mut self.rng,
            );
            if !result.ok && self.config.allow_partial_paths {
                result = result.accept_partial(self.config.min_cover_ratio);
            }
            self.metrics.record_path(&result);
            if result.ok {
                return Ok(result);
            }
            debug!("path: {mode} failed with {}", result.reason);
            last = result.reason;
        }
        Err(last)
    }

    /// Removes clues greedily while the puzzle stays unique.
    ///
    /// Returns the final puzzle, its solution, and its last validation report.
    fn reduce_clues(
        &mut self,
        mut puzzle: Puzzle,
        mut path: Solution,
    ) -> (Puzzle, Solution, UniquenessReport) {
        self.advance(GenerationState::ClueReducing);
        let policy = self.config.inconclusive_policy;
        let difficulty = self.config.difficulty;
        let mut validator = UniquenessValidator::new(self.config.validator_config());
        let mut repair = StructuralRepair::new(
            self.config.structural_repair_enabled,
            self.config.structural_repair_max,
        );

        // Removal order is fixed by cell, so it survives renumbering after a repair.
        let mut order = path.positions().to_vec();
        order.shuffle(&mut self.rng);

        for pos in order {
            let max_value = puzzle.max_value();
            if puzzle.clue_count() <= difficulty.min_clues(max_value) {
                break;
            }
            let Some(value) = path.value_at(pos) else {
                continue;
            };
            if value == 1 || value == max_value || puzzle.given_position(value) != Some(pos) {
                continue;
            }

            self.advance(GenerationState::Validating);
            self.metrics.removals_tried += 1;
            let candidate = puzzle.without_clue(value);
            let report = self.validate(&mut validator, &candidate);
            if policy.accepts(report.decision) {
                puzzle = candidate;
                self.metrics.removals_accepted += 1;
                continue;
            }
            if !report.decision.is_non_unique() {
                continue;
            }

            self.advance(GenerationState::Repairing);
            let repair_started = Instant::now();
            let outcome = repair.repair(
                &puzzle,
                value,
                &path,
                &report.witnesses,
                &mut validator,
                &mut self.rng,
                Deadline::never(),
            );
            self.metrics.timings.repair_ms += elapsed_ms(repair_started);
            self.metrics
                .repair_actions
                .extend_from_slice(&outcome.actions);
            if outcome.is_structural() {
                self.metrics.repairs_applied += 1;
                self.metrics.removals_accepted += 1;
            } else {
                self.metrics.clues_reinstated += 1;
            }
            puzzle = outcome.puzzle;
            path = outcome.path;
            self.advance(GenerationState::Validating);
        }

        self.advance(GenerationState::Validating);
        let report = self.validate(&mut validator, &puzzle);
        self.metrics.memo_hits = validator.memo_hits();
        self.metrics.repair_attempts = repair.attempts();
        (puzzle, path, report)
    }

    fn validate(&mut self, validator: &mut UniquenessValidator, puzzle: &Puzzle) -> UniquenessReport {
        let started = Instant::now();
        let report = validator.validate(puzzle, &mut self.rng);
        self.metrics.timings.validation_ms += elapsed_ms(started);
        self.metrics.validations += 1;
        self.metrics.search_nodes += report.nodes;
        if report.decision.is_inconclusive() {
            self.metrics.inconclusive += 1;
        }
        report
    }
}

fn path_len(path: &Solution) -> u32 {
    u32::try_from(path.len()).unwrap_or(u32::MAX)
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
