use std::{
    collections::HashMap,
    fmt::{self, Display},
    str::FromStr,
    time::Duration,
};

use log::debug;
use rand::Rng;

use crate::{Deadline, Direction, Puzzle, SearchConfig, SearchOutcome, Solution, search};

/// Tri-state answer of the [`UniquenessValidator`].
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
pub enum UniquenessDecision {
    /// Exactly one completion exists.
    #[display("unique")]
    Unique,
    /// Two distinct completions were found, or none exists.
    #[display("non-unique")]
    NonUnique,
    /// No stage reached a definitive answer within the budget.
    #[display("inconclusive")]
    Inconclusive,
}

/// The stage that produced a decision.
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
)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMethod {
    /// Stage 1, deterministic search capped at two solutions.
    #[display("early_exit")]
    EarlyExit,
    /// Stage 2, randomized probes.
    #[display("probe")]
    Probe,
    /// Stage 3, enumeration with the remaining budget.
    #[display("exhaustive")]
    Exhaustive,
    /// A cached decision for identical givens and board shape.
    #[display("memo")]
    Memo,
    /// Every stage ran out of budget.
    #[display("budget_exhausted")]
    BudgetExhausted,
}

/// How a caller treats an [`UniquenessDecision::Inconclusive`] answer.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InconclusivePolicy {
    /// Treat the puzzle as non-unique; the generator keeps the clue.
    #[default]
    Conservative,
    /// Treat the puzzle as unique.
    Aggressive,
}

impl InconclusivePolicy {
    /// Returns `true` if a puzzle with this decision may be accepted as unique.
    #[must_use]
    pub fn accepts(self, decision: UniquenessDecision) -> bool {
        match decision {
            UniquenessDecision::Unique => true,
            UniquenessDecision::NonUnique => false,
            UniquenessDecision::Inconclusive => self == Self::Aggressive,
        }
    }
}

impl Display for InconclusivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conservative => f.write_str("conservative"),
            Self::Aggressive => f.write_str("aggressive"),
        }
    }
}

impl FromStr for InconclusivePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown [`InconclusivePolicy`] name.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown inconclusive policy {_0:?}")]
pub struct UnknownPolicy(#[error(not(source))] String);

/// Budget and stage parameters of the [`UniquenessValidator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatorConfig {
    /// Total wall-clock budget of one validation.
    pub budget: Duration,
    /// Share of the budget given to the early-exit stage.
    pub early_exit_share: f64,
    /// Share of the budget given to the probe stage, split evenly across probes.
    pub probe_share: f64,
    /// Number of randomized probes.
    pub probe_count: usize,
    /// Boards with at most this many open cells always run the exhaustive stage.
    pub exhaustive_cell_limit: usize,
    /// Run the exhaustive stage on every board.
    pub final_confirmation: bool,
}

impl ValidatorConfig {
    /// Returns the configuration with a different total budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            budget: Duration::from_millis(400),
            early_exit_share: 0.4,
            probe_share: 0.4,
            probe_count: 4,
            exhaustive_cell_limit: 25,
            final_confirmation: false,
        }
    }
}

/// Result of one validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessReport {
    /// The tri-state answer.
    pub decision: UniquenessDecision,
    /// The stage that produced it.
    pub method: DecisionMethod,
    /// Distinct completions seen; two or more for a non-unique answer found by search.
    pub witnesses: Vec<Solution>,
    /// Search nodes visited across all stages.
    pub nodes: u64,
    /// Number of stages that ran.
    pub stages: u8,
}

impl UniquenessReport {
    /// Returns `true` if the puzzle was proven to have no completion.
    #[must_use]
    pub fn is_unsolvable(&self) -> bool {
        self.decision.is_non_unique() && self.witnesses.is_empty()
    }
}

#[derive(Debug, Clone)]
struct MemoEntry {
    decision: UniquenessDecision,
    witnesses: Vec<Solution>,
}

/// Decides whether a puzzle has exactly one completion.
///
/// Stages run in order of increasing cost, each with its own share of the
/// budget, and the first definitive answer wins:
///
/// 1. deterministic search capped at two solutions
/// 2. randomized probes with independent seeded sub-streams, alternating value
///    direction; any second distinct completion (including one distinct from a
///    stage-1 witness) proves non-uniqueness, and a probe that explores its
///    whole space is a certificate
/// 3. enumeration with the remaining budget, for small boards or when
///    [`ValidatorConfig::final_confirmation`] is set
///
/// Definitive answers are cached by (givens signature, board-shape signature),
/// so repeated validations of the same state are free.
#[derive(Debug, Clone)]
pub struct UniquenessValidator {
    config: ValidatorConfig,
    memo: HashMap<(u64, u64), MemoEntry>,
    memo_hits: u64,
}

impl UniquenessValidator {
    /// Creates a validator with an empty memo table.
    #[must_use]
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            memo: HashMap::new(),
            memo_hits: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Returns the number of cached decisions.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Returns how many validations were answered from the cache.
    #[must_use]
    pub fn memo_hits(&self) -> u64 {
        self.memo_hits
    }

    /// Validates `puzzle` within the configured budget.
    pub fn validate<R>(&mut self, puzzle: &Puzzle, rng: &mut R) -> UniquenessReport
    where
        R: Rng + ?Sized,
    {
        self.validate_until(puzzle, rng, Deadline::never())
    }

    /// Validates `puzzle` within the configured budget, never past `outer`.
    ///
    /// Probe seeds are drawn from `rng` only when the probe stage runs.
    pub fn validate_until<R>(
        &mut self,
        puzzle: &Puzzle,
        rng: &mut R,
        outer: Deadline,
    ) -> UniquenessReport
    where
        R: Rng + ?Sized,
    {
        let key = (puzzle.givens_signature(), puzzle.mask_signature());
        if let Some(entry) = self.memo.get(&key) {
            self.memo_hits += 1;
            return UniquenessReport {
                decision: entry.decision,
                method: DecisionMethod::Memo,
                witnesses: entry.witnesses.clone(),
                nodes: 0,
                stages: 0,
            };
        }

        let report = self.run_stages(puzzle, rng, outer);
        debug!(
            "uniqueness: decision={}, method={}, clues={}, nodes={}",
            report.decision,
            report.method,
            puzzle.clue_count(),
            report.nodes
        );
        if !report.decision.is_inconclusive() {
            self.memo.insert(
                key,
                MemoEntry {
                    decision: report.decision,
                    witnesses: report.witnesses.clone(),
                },
            );
        }
        report
    }

    fn run_stages<R>(&self, puzzle: &Puzzle, rng: &mut R, outer: Deadline) -> UniquenessReport
    where
        R: Rng + ?Sized,
    {
        let config = &self.config;
        let total = outer.sub_budget(config.budget);
        let mut tally = Tally::default();

        // Stage 1: early exit.
        let stage = total.sub_budget(config.budget.mul_f64(config.early_exit_share));
        let outcome = search(puzzle, SearchConfig::capped(2), stage);
        if let Some(decision) = tally.absorb(outcome) {
            return tally.finish(decision, DecisionMethod::EarlyExit);
        }

        // Stage 2: randomized probes.
        if config.probe_count > 0 {
            let seeds = (0..config.probe_count)
                .map(|_| rng.next_u64())
                .collect::<Vec<_>>();
            let per_probe = config
                .budget
                .mul_f64(config.probe_share)
                .div_f64(f64::from(u32::try_from(config.probe_count).unwrap_or(u32::MAX)));
            let mut direction = Direction::Backward;
            for seed in seeds {
                if total.is_expired() {
                    break;
                }
                let probe = SearchConfig::capped(2)
                    .with_direction(direction)
                    .with_shuffle_seed(seed);
                let outcome = search(puzzle, probe, total.sub_budget(per_probe));
                if let Some(decision) = tally.absorb(outcome) {
                    return tally.finish(decision, DecisionMethod::Probe);
                }
                direction = direction.flip();
            }
        }

        // Stage 3: enumeration with whatever budget is left.
        if (config.final_confirmation || puzzle.open_count() <= config.exhaustive_cell_limit)
            && !total.is_expired()
        {
            let outcome = search(
                puzzle,
                SearchConfig::capped(2).with_direction(Direction::Backward),
                total,
            );
            if let Some(decision) = tally.absorb(outcome) {
                return tally.finish(decision, DecisionMethod::Exhaustive);
            }
        }

        tally.finish(
            UniquenessDecision::Inconclusive,
            DecisionMethod::BudgetExhausted,
        )
    }
}

/// Evidence accumulated across stages.
#[derive(Debug, Default)]
struct Tally {
    witnesses: Vec<Solution>,
    nodes: u64,
    stages: u8,
}

impl Tally {
    /// Merges a stage outcome and returns a decision once one is definitive.
    fn absorb(&mut self, outcome: SearchOutcome) -> Option<UniquenessDecision> {
        self.stages += 1;
        self.nodes += outcome.nodes;
        let definitive = outcome.is_definitive();
        for solution in outcome.solutions {
            if !self.witnesses.contains(&solution) {
                self.witnesses.push(solution);
            }
        }
        if self.witnesses.len() >= 2 {
            return Some(UniquenessDecision::NonUnique);
        }
        if !definitive {
            return None;
        }
        Some(if self.witnesses.len() == 1 {
            UniquenessDecision::Unique
        } else {
            UniquenessDecision::NonUnique
        })
    }

    fn finish(self, decision: UniquenessDecision, method: DecisionMethod) -> UniquenessReport {
        UniquenessReport {
            decision,
            method,
            witnesses: self.witnesses,
            nodes: self.nodes,
            stages: self.stages,
        }
    }
}
