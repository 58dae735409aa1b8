//! Blocked-cell masks applied before path building.
//!
//! A mask blocks a few cells to give the board an irregular shape. Candidates
//! come from [`MaskTemplate`]s, tried in a seed-derived order, and from
//! procedural sampling once the templates are used up. Every candidate is
//! validated; the first valid one wins, and after `max_attempts` rejections
//! the board stays unmasked.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use hidato_core::{Adjacency, Grid, Position};
use hidato_solver::signature::SignatureBuilder;
use log::{debug, trace};
use rand::{Rng, RngExt as _, seq::SliceRandom as _};

pub use self::patterns::MaskTemplate;
use crate::{Difficulty, difficulty::UnknownOption};

mod patterns;
mod procedural;
mod validate;

/// Where mask candidates come from.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Templates in random order, then procedural sampling.
    #[default]
    Auto,
    /// Templates only.
    Template,
    /// Procedural sampling only.
    Procedural,
}

impl Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Template => "template",
            Self::Procedural => "procedural",
        })
    }
}

impl FromStr for MaskMode {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Auto, Self::Template, Self::Procedural]
            .into_iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| UnknownOption::new("mask mode", s))
    }
}

/// The source of an accepted mask.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum MaskPatternId {
    /// A named template.
    #[display("{_0}")]
    Template(MaskTemplate),
    /// Procedural sampling.
    #[display("procedural")]
    Procedural,
}

/// Why a mask candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum MaskRejection {
    /// The candidate blocks too large a share of the board.
    #[display("density {density:.3} exceeds cap {cap:.3}")]
    DensityExceeded {
        /// Requested or realized density.
        density: f64,
        /// The effective cap.
        cap: f64,
    },
    /// The candidate blocks a protected anchor cell.
    #[display("anchor {position} blocked")]
    AnchorBlocked {
        /// The blocked anchor.
        position: Position,
    },
    /// The open cells split into several large components.
    #[display("open cells split into {components} components")]
    Disconnected {
        /// Number of components.
        components: usize,
    },
    /// The open cells split off a small pocket.
    #[display("orphan pocket of {size} cells")]
    OrphanPocket {
        /// Size of the smallest component.
        size: usize,
    },
    /// The open cells cannot carry a Hamiltonian path.
    #[display("no hamiltonian path possible")]
    NoHamiltonianPath,
    /// The source produced no cells.
    #[display("empty candidate")]
    Empty,
}

/// A validated set of blocked cells.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockMask {
    /// Blocked cells in row-major order.
    pub cells: Vec<Position>,
    /// `cells.len()` over the board's total cell count.
    pub density: f64,
    /// Where the mask came from.
    pub pattern: MaskPatternId,
    /// Zero-based attempt that produced the mask.
    pub attempt_index: u32,
    /// Stable hash of the board size and the sorted cells.
    pub signature: u64,
}

impl BlockMask {
    fn new(grid: &Grid, mut cells: Vec<Position>, pattern: MaskPatternId, attempt_index: u32) -> Self {
        cells.sort_unstable();
        cells.dedup();
        Self {
            density: density(grid, cells.len()),
            signature: signature(grid, &cells),
            cells,
            pattern,
            attempt_index,
        }
    }

    /// Returns a copy of `grid` with the mask's cells blocked.
    #[must_use]
    pub fn apply(&self, grid: &Grid) -> Grid {
        grid.with_blocked(self.cells.iter().copied())
    }
}

/// Mask generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskSettings {
    /// Generate a mask at all.
    pub enabled: bool,
    /// Generate a mask even where the difficulty tier disables it.
    pub force: bool,
    /// Candidate sources.
    pub mode: MaskMode,
    /// Restrict template attempts to one template.
    pub template: Option<MaskTemplate>,
    /// Use exactly this density instead of a random one below the cap.
    pub density: Option<f64>,
    /// Most candidates to try.
    pub max_attempts: u32,
    /// Pockets smaller than this are reported as orphans.
    pub min_pocket: usize,
}

impl Default for MaskSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            force: false,
            mode: MaskMode::Auto,
            template: None,
            density: None,
            max_attempts: 8,
            min_pocket: 4,
        }
    }
}

/// Outcome of [`generate_mask`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaskOutcome {
    /// The accepted mask, or `None` if masks are disabled or every attempt failed.
    pub mask: Option<BlockMask>,
    /// Candidates tried.
    pub attempts: u32,
    /// Rejection of each failed candidate, in attempt order.
    pub rejections: Vec<MaskRejection>,
    /// Effective density cap, or `None` if masks are disabled for this board.
    pub cap: Option<f64>,
}

impl MaskOutcome {
    fn disabled() -> Self {
        Self {
            mask: None,
            attempts: 0,
            rejections: Vec::new(),
            cap: None,
        }
    }
}

/// Returns the density cap for the board size, or `None` below the minimum size.
#[must_use]
pub fn size_cap(grid: &Grid) -> Option<f64> {
    match grid.min_side() {
        0..5 => None,
        5..=7 => Some(0.10),
        8..=9 => Some(0.12),
        _ => Some(0.15),
    }
}

/// Returns the effective density cap, or `None` if masks are disabled.
///
/// The cap is the smaller of the size cap and the difficulty cap. A tier whose
/// cap is zero disables masks unless `force` is set, in which case the size cap
/// applies alone.
#[must_use]
pub fn effective_cap(grid: &Grid, difficulty: Difficulty, force: bool) -> Option<f64> {
    let size = size_cap(grid)?;
    let tier = difficulty.mask_density_cap();
    if tier > 0.0 {
        Some(size.min(tier))
    } else if force {
        Some(size)
    } else {
        None
    }
}

/// Generates a block mask for `grid`.
pub fn generate_mask<R>(
    grid: &Grid,
    adjacency: Adjacency,
    settings: &MaskSettings,
    difficulty: Difficulty,
    rng: &mut R,
) -> MaskOutcome
where
    R: Rng + ?Sized,
{
    if !settings.enabled {
        return MaskOutcome::disabled();
    }
    let Some(cap) = effective_cap(grid, difficulty, settings.force) else {
        debug!("mask: disabled for {difficulty} on a {}x{} board", grid.rows(), grid.cols());
        return MaskOutcome::disabled();
    };

    let templates = template_order(grid, settings, rng);
    let anchors = anchors(grid);
    let total = grid.cell_count();
    let mut outcome = MaskOutcome {
        mask: None,
        attempts: 0,
        rejections: Vec::new(),
        cap: Some(cap),
    };

    for attempt in 0..settings.max_attempts {
        outcome.attempts += 1;
        let source = match settings.mode {
            MaskMode::Procedural => MaskPatternId::Procedural,
            MaskMode::Template if !templates.is_empty() => {
                MaskPatternId::Template(templates[attempt as usize % templates.len()])
            }
            MaskMode::Auto if (attempt as usize) < templates.len() => {
                MaskPatternId::Template(templates[attempt as usize])
            }
            MaskMode::Template | MaskMode::Auto => MaskPatternId::Procedural,
        };
        let source_cap = match source {
            MaskPatternId::Template(template) => cap.min(template.max_density()),
            MaskPatternId::Procedural => cap,
        };
        let density = match settings.density {
            Some(density) => density,
            None => rng.random_range(source_cap * 0.5..=source_cap),
        };
        let result = if density > cap {
            Err(MaskRejection::DensityExceeded { density, cap })
        } else {
            let count = cell_count_for(density, total);
            let cells = match source {
                MaskPatternId::Template(template) => {
                    template.generate(grid.rows(), grid.cols(), count, rng)
                }
                MaskPatternId::Procedural => {
                    procedural::sample(grid, adjacency, count, &anchors, rng)
                }
            };
            if cells.is_empty() {
                Err(MaskRejection::Empty)
            } else if let Some(&position) = cells.iter().find(|&&pos| !grid.is_open(pos)) {
                // A template cell on an already blocked cell adds nothing.
                trace!("mask: {source} hit blocked cell {position}");
                Err(MaskRejection::Empty)
            } else {
                validate::validate_mask(grid, adjacency, &cells, &anchors, cap, settings.min_pocket)
                    .map(|()| cells)
            }
        };
        match result {
            Ok(cells) => {
                let mask = BlockMask::new(grid, cells, source, attempt);
                debug!(
                    "mask: accepted {} with {} cells (density {:.3}, cap {cap:.3}) on attempt {attempt}",
                    mask.pattern,
                    mask.cells.len(),
                    mask.density
                );
                outcome.mask = Some(mask);
                return outcome;
            }
            Err(rejection) => {
                trace!("mask: attempt {attempt} ({source}) rejected: {rejection}");
                outcome.rejections.push(rejection);
            }
        }
    }
    debug!(
        "mask: all {} attempts rejected; continuing without a mask",
        outcome.attempts
    );
    outcome
}

/// The cells a mask never blocks: the path start corner and the opposite corner.
pub(crate) fn anchors(grid: &Grid) -> Vec<Position> {
    let last = grid.cell_count().saturating_sub(1);
    let mut anchors = vec![grid.position(0), grid.position(last)];
    anchors.dedup();
    anchors
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn density(grid: &Grid, blocked: usize) -> f64 {
    blocked as f64 / grid.cell_count() as f64
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn cell_count_for(density: f64, total: usize) -> usize {
    ((density * total as f64).floor() as usize).max(1)
}

fn template_order<R>(grid: &Grid, settings: &MaskSettings, rng: &mut R) -> Vec<MaskTemplate>
where
    R: Rng + ?Sized,
{
    if let Some(template) = settings.template {
        return if grid.min_side() >= template.min_size() {
            vec![template]
        } else {
            Vec::new()
        };
    }
    let mut templates = MaskTemplate::ALL
        .into_iter()
        .filter(|t| grid.min_side() >= t.min_size())
        .collect::<Vec<_>>();
    templates.shuffle(rng);
    templates
}

fn signature(grid: &Grid, cells: &[Position]) -> u64 {
    let dim = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    cells
        .iter()
        .fold(
            SignatureBuilder::new("mask")
                .u32(dim(grid.rows()))
                .u32(dim(grid.cols()))
                .u32(dim(cells.len())),
            |builder, &pos| builder.position(pos),
        )
        .finish()
}

#[cfg(test)]
mod tests {
    use hidato_core::connectivity;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_caps() {
        let small = Grid::new(4, 4).unwrap();
        let six = Grid::new(6, 6).unwrap();
        let nine = Grid::new(9, 9).unwrap();
        let twelve = Grid::new(12, 12).unwrap();
        assert_eq!(size_cap(&small), None);
        assert_eq!(size_cap(&six), Some(0.10));
        assert_eq!(size_cap(&nine), Some(0.12));
        assert_eq!(effective_cap(&twelve, Difficulty::Medium, false), Some(0.10));
        assert_eq!(effective_cap(&twelve, Difficulty::Expert, false), Some(0.15));
        assert_eq!(effective_cap(&twelve, Difficulty::Easy, false), None);
        assert_eq!(effective_cap(&twelve, Difficulty::Easy, true), Some(0.15));
    }

    #[test]
    fn test_explicit_density_over_cap_rejects_every_attempt() {
        let grid = Grid::new(6, 6).unwrap();
        let settings = MaskSettings {
            density: Some(0.12),
            ..MaskSettings::default()
        };
        let mut rng = Pcg64::seed_from_u64(1);
        let outcome = generate_mask(&grid, Adjacency::Four, &settings, Difficulty::Medium, &mut rng);
        assert!(outcome.mask.is_none());
        assert_eq!(outcome.attempts, settings.max_attempts);
        assert_eq!(outcome.rejections.len(), settings.max_attempts as usize);
        assert!(
            outcome
                .rejections
                .iter()
                .all(|r| matches!(r, MaskRejection::DensityExceeded { .. }))
        );
    }

    #[test]
    fn test_accepted_masks_hold_invariants() {
        for seed in 0..40 {
            let grid = Grid::new(9, 9).unwrap();
            let mut rng = Pcg64::seed_from_u64(seed);
            let settings = MaskSettings::default();
            let outcome = generate_mask(&grid, Adjacency::Four, &settings, Difficulty::Hard, &mut rng);
            let Some(mask) = outcome.mask else {
                continue;
            };
            assert!(mask.density <= 0.12 + 1e-9);
            assert!(!mask.cells.contains(&Position::new(0, 0)));
            assert!(!mask.cells.contains(&Position::new(8, 8)));
            let masked = mask.apply(&grid);
            assert!(connectivity::is_connected(&masked, Adjacency::Four));
            assert_eq!(mask.signature, signature(&grid, &mask.cells));
        }
    }

    #[test]
    fn test_procedural_mode_finds_a_mask() {
        let grid = Grid::new(8, 8).unwrap();
        let settings = MaskSettings {
            mode: MaskMode::Procedural,
            ..MaskSettings::default()
        };
        let mut rng = Pcg64::seed_from_u64(12);
        let outcome = generate_mask(&grid, Adjacency::Eight, &settings, Difficulty::Expert, &mut rng);
        let mask = outcome.mask.unwrap();
        assert_eq!(mask.pattern, MaskPatternId::Procedural);
        assert!(!mask.cells.is_empty());
    }

    #[test]
    fn test_small_board_and_easy_tier_skip_masks() {
        let mut rng = Pcg64::seed_from_u64(1);
        let settings = MaskSettings::default();
        let small = Grid::new(4, 4).unwrap();
        let outcome = generate_mask(&small, Adjacency::Four, &settings, Difficulty::Hard, &mut rng);
        assert_eq!(outcome, MaskOutcome::disabled());
        let board = Grid::new(8, 8).unwrap();
        let outcome = generate_mask(&board, Adjacency::Four, &settings, Difficulty::Easy, &mut rng);
        assert_eq!(outcome.cap, None);
    }
}
