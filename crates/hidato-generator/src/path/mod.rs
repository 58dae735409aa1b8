//! Hamiltonian path construction over the open cells of a board.
//!
//! [`build_path`] dispatches on [`PathMode`] and reports what happened in a
//! [`PathBuildResult`]. The builder never substitutes one mode for another and
//! never decides whether partial coverage is good enough; both are
//! orchestrator decisions (see [`PathBuildResult::accept_partial`]).

use std::{
    fmt::{self, Display},
    str::FromStr,
    time::{Duration, Instant},
};

use hidato_core::{Adjacency, Grid, Position};
use hidato_solver::{Deadline, Solution};
use log::debug;
use rand::Rng;

use crate::difficulty::UnknownOption;

mod backbite;
mod random_walk;
mod serpentine;

/// Path construction strategy.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PathMode {
    /// Row-by-row boustrophedon; only succeeds on a board without blocked cells.
    #[serde(rename = "serpentine")]
    Serpentine,
    /// Endpoint-reversal mutations applied to a seed path.
    #[default]
    #[serde(rename = "backbite_v1")]
    BackbiteV1,
    /// Warnsdorff-ordered randomized walk with restarts.
    #[serde(rename = "random_walk_v2")]
    RandomWalkV2,
}

impl PathMode {
    /// All modes in fallback order.
    pub const ALL: [Self; 3] = [Self::BackbiteV1, Self::RandomWalkV2, Self::Serpentine];

    /// Returns this mode followed by the remaining modes in fallback order.
    pub fn with_fallbacks(self) -> impl Iterator<Item = Self> {
        [self]
            .into_iter()
            .chain(Self::ALL.into_iter().filter(move |&mode| mode != self))
    }
}

impl Display for PathMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Serpentine => "serpentine",
            Self::BackbiteV1 => "backbite_v1",
            Self::RandomWalkV2 => "random_walk_v2",
        })
    }
}

impl FromStr for PathMode {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| UnknownOption::new("path mode", s))
    }
}

/// Why a path build ended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum PathReason {
    /// Every open cell is on the path.
    #[display("success")]
    Success,
    /// The time budget expired.
    #[display("timeout")]
    Timeout,
    /// Every walk or mutation allowance was used without full coverage.
    #[display("exhausted_restarts")]
    ExhaustedRestarts,
    /// Partial coverage was rejected by the acceptance policy.
    #[display("coverage_below_threshold")]
    CoverageBelowThreshold,
    /// Partial coverage was accepted; uncovered cells become blocked.
    #[display("partial_accepted")]
    PartialAccepted,
}

/// Work counters of a path build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PathMetrics {
    /// Walk steps or mutation attempts.
    pub steps: u64,
    /// Walk restarts.
    pub restarts: u32,
}

/// Outcome of [`build_path`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathBuildResult {
    /// `true` if `positions` may be used as a solution path.
    pub ok: bool,
    /// Why the build ended.
    pub reason: PathReason,
    /// Fraction of open cells on the path.
    pub coverage_ratio: f64,
    /// The path; the cell of value `v` is at index `v - 1`.
    pub positions: Vec<Position>,
    /// The mode that produced the path.
    pub mode_used: PathMode,
    /// Wall-clock time spent.
    pub elapsed_ms: u64,
    /// Work counters.
    pub metrics: PathMetrics,
}

impl PathBuildResult {
    fn new(
        mode: PathMode,
        positions: Vec<Position>,
        open_count: usize,
        reason: PathReason,
        metrics: PathMetrics,
        started: Instant,
    ) -> Self {
        let coverage_ratio = if open_count == 0 {
            0.0
        } else {
            ratio(positions.len(), open_count)
        };
        Self {
            ok: reason.is_success(),
            reason,
            coverage_ratio,
            positions,
            mode_used: mode,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            metrics,
        }
    }

    /// Applies the partial-coverage policy to a failed build.
    ///
    /// A failed build covering at least `min_cover_ratio` of the open cells
    /// becomes [`PathReason::PartialAccepted`]; otherwise it becomes
    /// [`PathReason::CoverageBelowThreshold`]. Successful builds are returned
    /// unchanged.
    #[must_use]
    pub fn accept_partial(mut self, min_cover_ratio: f64) -> Self {
        if self.ok {
            return self;
        }
        if !self.positions.is_empty() && self.coverage_ratio >= min_cover_ratio {
            self.ok = true;
            self.reason = PathReason::PartialAccepted;
        } else {
            self.reason = PathReason::CoverageBelowThreshold;
        }
        self
    }

    /// Returns the path as a [`Solution`].
    #[must_use]
    pub fn solution(&self) -> Solution {
        Solution::new(self.positions.clone())
    }

    /// Returns the open cells of `grid` that the path does not visit.
    pub fn uncovered<'a>(&'a self, grid: &'a Grid) -> impl Iterator<Item = Position> + 'a {
        let mut on_path = vec![false; grid.cell_count()];
        for &pos in &self.positions {
            on_path[grid.index(pos)] = true;
        }
        grid.open_positions()
            .filter(move |&pos| !on_path[grid.index(pos)])
    }
}

/// Limits of a path build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathParams {
    /// Wall-clock budget of the whole build.
    pub time_budget: Duration,
    /// Most cells a single random walk may place; `None` for no limit.
    pub max_nodes: Option<usize>,
    /// Most random-walk restarts.
    pub max_restarts: u32,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(1000),
            max_nodes: None,
            max_restarts: 64,
        }
    }
}

/// Builds a path over the open cells of `grid` with the given `mode`.
///
/// Givens in `grid` are ignored. The build stops at `deadline` or after
/// `params.time_budget`, whichever comes first.
pub fn build_path<R>(
    grid: &Grid,
    adjacency: Adjacency,
    mode: PathMode,
    params: &PathParams,
    deadline: Deadline,
    rng: &mut R,
) -> PathBuildResult
where
    R: Rng + ?Sized,
{
    let started = Instant::now();
    let deadline = deadline.sub_budget(params.time_budget);
    let open_count = grid.open_count();
    let (positions, reason, metrics) = match mode {
        PathMode::Serpentine => serpentine::build(grid),
        PathMode::BackbiteV1 => backbite::build(grid, adjacency, params, deadline, rng),
        PathMode::RandomWalkV2 => {
            random_walk::build(grid, adjacency, params.max_nodes, params.max_restarts, deadline, rng)
        }
    };
    let result = PathBuildResult::new(mode, positions, open_count, reason, metrics, started);
    debug!(
        "path: mode={mode}, reason={}, coverage={:.3}, steps={}, restarts={}",
        result.reason, result.coverage_ratio, result.metrics.steps, result.metrics.restarts
    );
    result
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}
