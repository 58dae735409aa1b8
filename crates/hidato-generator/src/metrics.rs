use hidato_solver::{DecisionMethod, UniquenessDecision};

use crate::{
    GenerationState,
    mask::{MaskOutcome, MaskPatternId, MaskRejection},
    path::{PathBuildResult, PathMode, PathReason},
    repair::RepairAction,
};

/// Structured record of one generation run.
///
/// Everything except [`timings`](Self::timings) is a pure function of the seed
/// and the configuration as long as no wall-clock budget expires; compare
/// [`without_timings`](Self::without_timings) to check reproducibility.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationMetrics {
    /// Mask candidates tried.
    pub mask_attempts: u32,
    /// Rejection of each failed mask candidate.
    pub mask_rejections: Vec<MaskRejection>,
    /// Source of the applied mask.
    pub mask_pattern: Option<MaskPatternId>,
    /// Density of the applied mask.
    pub mask_density: f64,
    /// Signature of the applied mask.
    pub mask_signature: Option<u64>,
    /// `true` if the mask was dropped because no path mode could cover it.
    pub mask_dropped: bool,

    /// Mode of the accepted path.
    pub path_mode: PathMode,
    /// How the accepted (or last) path build ended.
    pub path_reason: Option<PathReason>,
    /// Coverage of the accepted path before partial acceptance.
    pub path_coverage: f64,
    /// Path builds run, including fallbacks.
    pub path_builds: u32,
    /// Walk steps or mutation attempts across builds.
    pub path_steps: u64,
    /// Walk restarts across builds.
    pub path_restarts: u32,
    /// Open cells blocked because the accepted path missed them.
    pub uncovered_blocked: usize,

    /// Clues in the final puzzle.
    pub clue_count: usize,
    /// Values in the final puzzle.
    pub max_value: u32,
    /// Clue removals tried.
    pub removals_tried: u32,
    /// Clue removals kept.
    pub removals_accepted: u32,

    /// Decision of the final validation.
    pub uniqueness_decision: Option<UniquenessDecision>,
    /// Stage that produced the final decision.
    pub uniqueness_method: Option<DecisionMethod>,
    /// Validations run.
    pub validations: u32,
    /// Validations that ended inconclusive.
    pub inconclusive: u32,
    /// Validations answered from the memo table.
    pub memo_hits: u64,
    /// Search nodes across validations.
    pub search_nodes: u64,

    /// Structural blocks tried.
    pub repair_attempts: usize,
    /// Structural blocks kept.
    pub repairs_applied: u32,
    /// Clues reinstated after a removal made the puzzle ambiguous.
    pub clues_reinstated: u32,
    /// Every repair action, in order.
    pub repair_actions: Vec<RepairAction>,

    /// State transitions of the attempt.
    pub states: Vec<GenerationState>,
    /// Wall-clock time per stage.
    pub timings: StageTimings,
}

impl GenerationMetrics {
    /// Returns a copy with wall-clock fields zeroed.
    #[must_use]
    pub fn without_timings(&self) -> Self {
        Self {
            timings: StageTimings::default(),
            ..self.clone()
        }
    }

    pub(crate) fn record_mask(&mut self, outcome: &MaskOutcome) {
        self.mask_attempts = outcome.attempts;
        self.mask_rejections.clone_from(&outcome.rejections);
        if let Some(mask) = &outcome.mask {
            self.mask_pattern = Some(mask.pattern);
            self.mask_density = mask.density;
            self.mask_signature = Some(mask.signature);
        }
    }

    pub(crate) fn clear_mask(&mut self) {
        self.mask_pattern = None;
        self.mask_density = 0.0;
        self.mask_signature = None;
        self.mask_dropped = true;
    }

    pub(crate) fn record_path(&mut self, result: &PathBuildResult) {
        self.path_builds += 1;
        self.path_steps += result.metrics.steps;
        self.path_restarts += result.metrics.restarts;
        self.path_mode = result.mode_used;
        self.path_reason = Some(result.reason);
        self.path_coverage = result.coverage_ratio;
        self.timings.path_ms += result.elapsed_ms;
    }
}

/// Wall-clock milliseconds spent per stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageTimings {
    /// Mask generation.
    pub mask_ms: u64,
    /// Path building.
    pub path_ms: u64,
    /// Uniqueness validation during clue reduction.
    pub validation_ms: u64,
    /// Structural repair.
    pub repair_ms: u64,
    /// The whole attempt.
    pub total_ms: u64,
}
