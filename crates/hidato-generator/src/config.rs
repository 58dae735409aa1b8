use std::time::Duration;

use hidato_core::{Adjacency, Grid};
use hidato_solver::{InconclusivePolicy, ValidatorConfig};

use crate::{
    Difficulty,
    mask::{MaskMode, MaskSettings, MaskTemplate},
    path::{PathMode, PathParams},
    repair::MAX_STRUCTURAL_ATTEMPTS,
};

/// Largest supported board side.
const MAX_SIDE: usize = 64;

/// Configuration of a [`PuzzleGenerator`](crate::PuzzleGenerator).
///
/// Every option has a default; `with_*` helpers adjust the common ones and
/// [`validate`](Self::validate) rejects inconsistent values before any
/// generation work starts.
///
/// # Examples
///
/// ```
/// use hidato_generator::{Difficulty, GeneratorConfig, PathMode};
///
/// let config = GeneratorConfig::default()
///     .with_size(6, 6)
///     .with_difficulty(Difficulty::Hard)
///     .with_path_mode(PathMode::RandomWalkV2)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneratorConfig {
    /// Board rows.
    pub rows: usize,
    /// Board columns.
    pub cols: usize,
    /// Neighbour rule.
    pub adjacency: Adjacency,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Path construction strategy.
    pub path_mode: PathMode,
    /// Try the other modes when the configured one fails.
    pub path_mode_fallback: bool,
    /// Wall-clock budget of one path build, in milliseconds.
    pub path_time_ms: u64,
    /// Most cells a single random walk may place.
    pub random_walk_max_nodes: Option<usize>,
    /// Most random-walk restarts.
    pub random_walk_max_restarts: u32,
    /// Accept a path that misses some open cells.
    pub allow_partial_paths: bool,
    /// Smallest coverage accepted for a partial path.
    pub min_cover_ratio: f64,
    /// Block a few cells before building the path.
    pub mask_enabled: bool,
    /// Generate a mask even where the difficulty tier disables it.
    pub mask_force: bool,
    /// Where mask candidates come from.
    pub mask_mode: MaskMode,
    /// Restrict template masks to one template.
    pub mask_template: Option<MaskTemplate>,
    /// Use exactly this mask density.
    pub mask_density: Option<f64>,
    /// Most mask candidates to try.
    pub mask_max_attempts: u32,
    /// Try blocking a cell before reinstating a clue.
    pub structural_repair_enabled: bool,
    /// Most structural repairs per puzzle.
    pub structural_repair_max: usize,
    /// How inconclusive uniqueness answers are treated.
    pub inconclusive_policy: InconclusivePolicy,
    /// Randomized probes per validation.
    pub probe_count: usize,
    /// Run exhaustive enumeration on every validation.
    pub final_confirmation: bool,
    /// Seed of the run.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 7,
            cols: 7,
            adjacency: Adjacency::Four,
            difficulty: Difficulty::Medium,
            path_mode: PathMode::BackbiteV1,
            path_mode_fallback: true,
            path_time_ms: 1000,
            random_walk_max_nodes: None,
            random_walk_max_restarts: 64,
            allow_partial_paths: false,
            min_cover_ratio: 0.85,
            mask_enabled: true,
            mask_force: false,
            mask_mode: MaskMode::Auto,
            mask_template: None,
            mask_density: None,
            mask_max_attempts: 8,
            structural_repair_enabled: true,
            structural_repair_max: MAX_STRUCTURAL_ATTEMPTS,
            inconclusive_policy: InconclusivePolicy::Conservative,
            probe_count: 4,
            final_confirmation: false,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Sets the board size.
    #[must_use]
    pub fn with_size(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Sets the neighbour rule.
    #[must_use]
    pub fn with_adjacency(mut self, adjacency: Adjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    /// Sets the difficulty tier.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the path construction strategy.
    #[must_use]
    pub fn with_path_mode(mut self, mode: PathMode) -> Self {
        self.path_mode = mode;
        self
    }

    /// Enables or disables masks.
    #[must_use]
    pub fn with_mask(mut self, enabled: bool) -> Self {
        self.mask_enabled = enabled;
        self
    }

    /// Accepts partial paths covering at least `min_cover_ratio` of the board.
    #[must_use]
    pub fn with_partial_paths(mut self, min_cover_ratio: f64) -> Self {
        self.allow_partial_paths = true;
        self.min_cover_ratio = min_cover_ratio;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the configuration for values no generation run can honour.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_SIDE).contains(&self.rows) || !(2..=MAX_SIDE).contains(&self.cols) {
            return Err(ConfigError::InvalidSize {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(0.5..=1.0).contains(&self.min_cover_ratio) {
            return Err(ConfigError::MinCoverRatioOutOfRange {
                value: self.min_cover_ratio,
            });
        }
        if self.path_time_ms == 0 {
            return Err(ConfigError::ZeroPathTime);
        }
        if self.random_walk_max_nodes == Some(0) {
            return Err(ConfigError::ZeroNodeBudget);
        }
        if let Some(value) = self.mask_density
            && !(value > 0.0 && value < 1.0)
        {
            return Err(ConfigError::MaskDensityOutOfRange { value });
        }
        if self.structural_repair_max > MAX_STRUCTURAL_ATTEMPTS {
            return Err(ConfigError::TooManyRepairs {
                value: self.structural_repair_max,
            });
        }
        Ok(())
    }

    /// Returns an empty board of the configured size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSize`] for sizes [`Grid`] rejects.
    pub fn board(&self) -> Result<Grid, ConfigError> {
        Grid::new(self.rows, self.cols).map_err(|_| ConfigError::InvalidSize {
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Returns the validator settings for the configured difficulty.
    #[must_use]
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            probe_count: self.probe_count,
            final_confirmation: self.final_confirmation,
            ..ValidatorConfig::default()
        }
        .with_budget(self.difficulty.validator_budget())
    }

    /// Returns the mask settings.
    #[must_use]
    pub fn mask_settings(&self) -> MaskSettings {
        MaskSettings {
            enabled: self.mask_enabled,
            force: self.mask_force,
            mode: self.mask_mode,
            template: self.mask_template,
            density: self.mask_density,
            max_attempts: self.mask_max_attempts,
            ..MaskSettings::default()
        }
    }

    /// Returns the path build limits.
    #[must_use]
    pub fn path_params(&self) -> PathParams {
        PathParams {
            time_budget: Duration::from_millis(self.path_time_ms),
            max_nodes: self.random_walk_max_nodes,
            max_restarts: self.random_walk_max_restarts,
        }
    }
}

/// A configuration value no generation run can honour.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    /// A board side is outside `2..=64`.
    #[display("board size {rows}x{cols} is outside 2x2..=64x64")]
    InvalidSize {
        /// Rows.
        rows: usize,
        /// Columns.
        cols: usize,
    },
    /// `min_cover_ratio` is outside `[0.5, 1.0]`.
    #[display("min_cover_ratio {value} is outside [0.5, 1.0]")]
    MinCoverRatioOutOfRange {
        /// The configured value.
        value: f64,
    },
    /// `path_time_ms` is zero.
    #[display("path_time_ms must be positive")]
    ZeroPathTime,
    /// `random_walk_max_nodes` is zero.
    #[display("random_walk_max_nodes must be positive")]
    ZeroNodeBudget,
    /// `mask_density` is outside `(0, 1)`.
    #[display("mask_density {value} is outside (0, 1)")]
    MaskDensityOutOfRange {
        /// The configured value.
        value: f64,
    },
    /// `structural_repair_max` exceeds the per-puzzle limit.
    #[display("structural_repair_max {value} exceeds {MAX_STRUCTURAL_ATTEMPTS}")]
    TooManyRepairs {
        /// The configured value.
        value: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(GeneratorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = GeneratorConfig::default();
        assert!(matches!(
            base.clone().with_size(1, 5).validate(),
            Err(ConfigError::InvalidSize { .. })
        ));
        assert!(matches!(
            base.clone().with_partial_paths(0.4).validate(),
            Err(ConfigError::MinCoverRatioOutOfRange { .. })
        ));
        assert_eq!(
            GeneratorConfig {
                path_time_ms: 0,
                ..base.clone()
            }
            .validate(),
            Err(ConfigError::ZeroPathTime)
        );
        assert!(matches!(
            GeneratorConfig {
                mask_density: Some(1.5),
                ..base.clone()
            }
            .validate(),
            Err(ConfigError::MaskDensityOutOfRange { .. })
        ));
        assert_eq!(
            GeneratorConfig {
                structural_repair_max: 3,
                ..base
            }
            .validate(),
            Err(ConfigError::TooManyRepairs { value: 3 })
        );
    }

    #[test]
    fn test_validator_budget_follows_difficulty() {
        let config = GeneratorConfig::default().with_difficulty(Difficulty::Expert);
        assert_eq!(config.validator_config().budget, Duration::from_millis(600));
    }
}
