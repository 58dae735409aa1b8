//! Ambiguity-aware structural repair.
//!
//! When removing a clue makes a puzzle non-unique, the generator would
//! normally put the clue back. Repair first tries to block one cell where the
//! two competing completions diverge: blocking it removes one value from the
//! puzzle (givens above it are renumbered down by one) and often removes the
//! ambiguity without revealing anything. Candidates are ranked by
//! [`AmbiguityRegion`] statistics; each tentative block is re-checked for
//! connectivity, solvability and uniqueness. At most
//! [`MAX_STRUCTURAL_ATTEMPTS`] blocks are tried per puzzle, after which the
//! removed clue is reinstated.
//!
//! On a 4-neighbour board blocking a cell flips the colour parity required
//! between the cells of 1 and `N`, so every tentative block fails the
//! solvability check there and repair falls back to the clue.

use std::collections::HashSet;

use hidato_core::{CellState, Position, connectivity};
use hidato_solver::{Deadline, Puzzle, Solution, UniquenessDecision, UniquenessValidator, solve};
use log::debug;
use rand::Rng;

/// Upper bound on structural repair attempts per puzzle.
pub const MAX_STRUCTURAL_ATTEMPTS: usize = 2;

/// What a repair action changes.
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
pub enum RepairKind {
    /// Block a cell.
    #[display("block")]
    Block,
    /// Reinstate a removed clue.
    #[display("clue")]
    Clue,
}

/// Why a repair action was applied or rejected.
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
pub enum RepairReason {
    /// The block made the puzzle unique.
    #[display("resolved")]
    Resolved,
    /// The block split the open cells.
    #[display("disconnected")]
    Disconnected,
    /// The blocked puzzle has no completion.
    #[display("unsolvable")]
    Unsolvable,
    /// The blocked puzzle is still non-unique.
    #[display("still_ambiguous")]
    StillAmbiguous,
    /// Uniqueness of the blocked puzzle could not be decided in time.
    #[display("inconclusive")]
    Inconclusive,
    /// Structural repair was unavailable; the removed clue was reinstated.
    #[display("clue_reinstated")]
    ClueReinstated,
}

/// One step taken by the repairer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RepairAction {
    /// What the action changes.
    pub kind: RepairKind,
    /// The blocked cell or the cell of the reinstated clue.
    pub position: Position,
    /// `true` if the action is part of the returned puzzle.
    pub applied: bool,
    /// Why it was applied or rejected.
    pub reason: RepairReason,
}

/// A connected group of cells where the completions disagree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AmbiguityRegion {
    /// Cells in row-major order.
    pub cells: Vec<Position>,
    /// Sum over the cells of the number of witnesses disagreeing there.
    pub divergence_count: u32,
    /// Largest open-neighbour count of a cell in the region.
    pub corridor_width: u32,
    /// Smallest distance from a cell of the region to a given.
    pub distance_from_clues: u32,
}

impl AmbiguityRegion {
    /// Returns the ranking score of the region.
    #[must_use]
    pub fn score(&self) -> f64 {
        f64::from(self.divergence_count)
            * f64::from(self.corridor_width)
            * f64::from(self.distance_from_clues)
    }
}

/// Result of [`StructuralRepair::repair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    /// The repaired puzzle, or the puzzle with the clue reinstated.
    pub puzzle: Puzzle,
    /// A solution of `puzzle`.
    pub path: Solution,
    /// Every action tried, the applied one last.
    pub actions: Vec<RepairAction>,
    /// Ambiguity regions, highest score first.
    pub regions: Vec<AmbiguityRegion>,
}

impl RepairOutcome {
    /// Returns `true` if a cell was blocked instead of reinstating the clue.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.actions
            .last()
            .is_some_and(|action| action.applied && action.kind.is_block())
    }
}

/// Per-puzzle repair state carrying the attempt allowance.
#[derive(Debug, Clone)]
pub struct StructuralRepair {
    enabled: bool,
    max_attempts: usize,
    attempts: usize,
}

impl StructuralRepair {
    /// Creates a repairer allowing `max_attempts` blocks, capped at
    /// [`MAX_STRUCTURAL_ATTEMPTS`].
    #[must_use]
    pub fn new(enabled: bool, max_attempts: usize) -> Self {
        Self {
            enabled,
            max_attempts: max_attempts.min(MAX_STRUCTURAL_ATTEMPTS),
            attempts: 0,
        }
    }

    /// Returns the number of blocks tried so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Returns the number of blocks that may still be tried.
    #[must_use]
    pub fn remaining(&self) -> usize {
        if self.enabled {
            self.max_attempts - self.attempts
        } else {
            0
        }
    }

    /// Repairs the ambiguity caused by removing clue `removed` from `previous`.
    ///
    /// `path` is the current solution of `previous`, and `witnesses` are the
    /// completions the validator found for the puzzle without the clue. The
    /// inputs are never modified; the returned puzzle is either a blocked
    /// variant without the clue or `previous` itself.
    #[allow(clippy::too_many_arguments)]
    pub fn repair<R>(
        &mut self,
        previous: &Puzzle,
        removed: u32,
        path: &Solution,
        witnesses: &[Solution],
        validator: &mut UniquenessValidator,
        rng: &mut R,
        deadline: Deadline,
    ) -> RepairOutcome
    where
        R: Rng + ?Sized,
    {
        let candidate = previous.without_clue(removed);
        let rivals = witnesses
            .iter()
            .filter(|w| *w != path && w.len() == path.len())
            .collect::<Vec<_>>();
        let (regions, ranked) = rank_candidates(&candidate, path, &rivals);
        let mut actions = Vec::new();

        for pos in ranked {
            if self.remaining() == 0 || deadline.is_expired() {
                break;
            }
            self.attempts += 1;
            match try_block(&candidate, path, pos, validator, rng, deadline) {
                Ok((puzzle, solution)) => {
                    debug!("repair: blocked {pos}, puzzle is unique again");
                    actions.push(RepairAction {
                        kind: RepairKind::Block,
                        position: pos,
                        applied: true,
                        reason: RepairReason::Resolved,
                    });
                    return RepairOutcome {
                        puzzle,
                        path: solution,
                        actions,
                        regions,
                    };
                }
                Err(reason) => {
                    debug!("repair: blocking {pos} rejected: {reason}");
                    actions.push(RepairAction {
                        kind: RepairKind::Block,
                        position: pos,
                        applied: false,
                        reason,
                    });
                }
            }
        }

        let position = previous
            .given_position(removed)
            .or_else(|| path.position_of(removed))
            .unwrap_or_else(|| Position::new(0, 0));
        actions.push(RepairAction {
            kind: RepairKind::Clue,
            position,
            applied: true,
            reason: RepairReason::ClueReinstated,
        });
        RepairOutcome {
            puzzle: previous.clone(),
            path: path.clone(),
            actions,
            regions,
        }
    }
}

/// Groups divergent cells into regions and ranks the cells that may be blocked.
///
/// A cell's score is the number of rival completions disagreeing with `path`
/// there, times its open-neighbour count, times its distance to the nearest
/// given. Higher scores come first; ties go to the earlier row-major position.
fn rank_candidates(
    puzzle: &Puzzle,
    path: &Solution,
    rivals: &[&Solution],
) -> (Vec<AmbiguityRegion>, Vec<Position>) {
    let grid = puzzle.grid();
    let adjacency = puzzle.adjacency();
    let mut frequency = vec![0u32; grid.cell_count()];
    for rival in rivals {
        for (&mine, &theirs) in path.positions().iter().zip(rival.positions()) {
            if mine != theirs {
                frequency[grid.index(mine)] += 1;
                frequency[grid.index(theirs)] += 1;
            }
        }
    }
    // Each disagreement at a cell is seen from both sides of the zip.
    for count in &mut frequency {
        *count /= 2;
    }

    let givens = puzzle.givens().map(|(_, pos)| pos).collect::<Vec<_>>();
    let width = |pos: Position| u32::try_from(grid.open_neighbors(pos, adjacency).len()).unwrap_or(0);
    let distance = |pos: Position| {
        givens
            .iter()
            .map(|&g| adjacency.distance(pos, g))
            .min()
            .unwrap_or(0)
    };

    let mut regions = connectivity::components(grid, adjacency, |pos| frequency[grid.index(pos)] > 0)
        .into_iter()
        .map(|mut cells| {
            cells.sort_unstable();
            AmbiguityRegion {
                divergence_count: cells.iter().map(|&p| frequency[grid.index(p)]).sum(),
                corridor_width: cells.iter().map(|&p| width(p)).max().unwrap_or(0),
                distance_from_clues: cells.iter().map(|&p| distance(p)).min().unwrap_or(0),
                cells,
            }
        })
        .collect::<Vec<_>>();
    regions.sort_by(|a, b| b.score().total_cmp(&a.score()).then_with(|| a.cells.cmp(&b.cells)));

    let anchors = [grid.position(0), grid.position(grid.cell_count() - 1)];
    let given_set = givens.iter().copied().collect::<HashSet<_>>();
    let mut ranked = regions
        .iter()
        .flat_map(|region| region.cells.iter().copied())
        .filter(|pos| !given_set.contains(pos) && !anchors.contains(pos))
        .map(|pos| (frequency[grid.index(pos)] * width(pos) * distance(pos), pos))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    (regions, ranked.into_iter().map(|(_, pos)| pos).collect())
}

/// Blocks `pos` in `candidate` and checks the result.
fn try_block<R>(
    candidate: &Puzzle,
    path: &Solution,
    pos: Position,
    validator: &mut UniquenessValidator,
    rng: &mut R,
    deadline: Deadline,
) -> Result<(Puzzle, Solution), RepairReason>
where
    R: Rng + ?Sized,
{
    let adjacency = candidate.adjacency();
    let value = path.value_at(pos).ok_or(RepairReason::Unsolvable)?;
    let mut grid = candidate.grid().without_givens().with_blocked([pos]);
    if !connectivity::is_connected(&grid, adjacency) {
        return Err(RepairReason::Disconnected);
    }
    for (given, at) in candidate.givens() {
        let renumbered = if given > value { given - 1 } else { given };
        grid.set(at, CellState::Given(renumbered));
    }
    let puzzle = Puzzle::new(grid, adjacency).map_err(|_| RepairReason::Unsolvable)?;

    let solvable_by = deadline.sub_budget(validator.config().budget);
    if solve(&puzzle, solvable_by).is_none() {
        return Err(RepairReason::Unsolvable);
    }
    let report = validator.validate_until(&puzzle, rng, deadline);
    match report.decision {
        UniquenessDecision::Unique => report
            .witnesses
            .into_iter()
            .next()
            .map(|solution| (puzzle, solution))
            .ok_or(RepairReason::Unsolvable),
        UniquenessDecision::NonUnique => Err(RepairReason::StillAmbiguous),
        UniquenessDecision::Inconclusive => Err(RepairReason::Inconclusive),
    }
}

#[cfg(test)]
mod tests {
    use hidato_core::{Adjacency, Grid};
    use hidato_solver::ValidatorConfig;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    fn row_serpentine_3x3() -> Solution {
        Solution::new(vec![
            Position::new(0, 0),
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(1, 2),
            Position::new(1, 1),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(2, 1),
            Position::new(2, 2),
        ])
    }

    #[test]
    fn test_four_neighbour_board_falls_back_to_clue() {
        let shape = Grid::new(3, 3).unwrap();
        let path = row_serpentine_3x3();
        let previous = Puzzle::from_solution(&shape, Adjacency::Four, &path, [1, 2, 9]).unwrap();
        let mut validator = UniquenessValidator::new(ValidatorConfig::default());
        let mut rng = Pcg64::seed_from_u64(3);

        let report = validator.validate(&previous.without_clue(2), &mut rng);
        assert_eq!(report.decision, UniquenessDecision::NonUnique);

        let mut repair = StructuralRepair::new(true, 5);
        let outcome = repair.repair(
            &previous,
            2,
            &path,
            &report.witnesses,
            &mut validator,
            &mut rng,
            Deadline::never(),
        );
        assert!(!outcome.is_structural());
        assert_eq!(outcome.puzzle, previous);
        assert_eq!(outcome.path, path);
        assert_eq!(repair.attempts(), MAX_STRUCTURAL_ATTEMPTS);
        assert_eq!(repair.remaining(), 0);
        let last = outcome.actions.last().unwrap();
        assert_eq!(last.kind, RepairKind::Clue);
        assert_eq!(last.position, Position::new(0, 1));
        assert!(
            outcome.actions[..outcome.actions.len() - 1]
                .iter()
                .all(|a| a.kind.is_block() && !a.applied && a.reason == RepairReason::Unsolvable)
        );
        assert!(!outcome.regions.is_empty());
    }

    #[test]
    fn test_disabled_repair_reinstates_clue() {
        let shape = Grid::new(3, 3).unwrap();
        let path = row_serpentine_3x3();
        let previous = Puzzle::from_solution(&shape, Adjacency::Four, &path, [1, 2, 9]).unwrap();
        let mut validator = UniquenessValidator::new(ValidatorConfig::default());
        let mut rng = Pcg64::seed_from_u64(3);
        let report = validator.validate(&previous.without_clue(2), &mut rng);

        let mut repair = StructuralRepair::new(false, 2);
        let outcome = repair.repair(
            &previous,
            2,
            &path,
            &report.witnesses,
            &mut validator,
            &mut rng,
            Deadline::never(),
        );
        assert_eq!(repair.attempts(), 0);
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.puzzle, previous);
    }

    #[test]
    fn test_region_statistics() {
        let shape = Grid::new(3, 3).unwrap();
        let path = row_serpentine_3x3();
        let puzzle = Puzzle::from_solution(&shape, Adjacency::Four, &path, [1, 9]).unwrap();
        let column = Solution::new(vec![
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(2, 1),
            Position::new(1, 1),
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(1, 2),
            Position::new(2, 2),
        ]);
        let (regions, ranked) = rank_candidates(&puzzle, &path, &[&column]);
        // The two corners and the centre keep their values.
        assert_eq!(regions.iter().map(|r| r.cells.len()).sum::<usize>(), 6);
        assert!(!ranked.contains(&Position::new(1, 1)));
        assert!(!ranked.contains(&Position::new(0, 0)));
        assert_eq!(ranked.len(), 6);
    }
}
