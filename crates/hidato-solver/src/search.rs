//! Time-budgeted backtracking over Hidato paths.
//!
//! The search extends the path one value at a time from the cell of the
//! previous value. Three prunings keep it tractable on the board sizes the
//! generator produces:
//!
//! - a given value must be adjacent to the cell of its predecessor
//! - a candidate cell must be within reach of the next given: no further away
//!   than the value gap, and on the 4-neighbour board with matching parity
//! - every unfilled cell and every later given must stay reachable from the
//!   path head through unfilled cells and later givens
//!
//! The search state is an arena of two vectors (cell to value, value to cell),
//! so placing and undoing a value is O(1).

use hidato_core::{Adjacency, Position};
use log::trace;
use rand::{SeedableRng as _, seq::SliceRandom as _};
use rand_pcg::Pcg64;

use crate::{Deadline, Puzzle, Solution};

/// How often, in visited nodes, the deadline is checked.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

const UNASSIGNED: usize = usize::MAX;

/// Order in which values are placed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Direction {
    /// From value 1 up to `N`.
    #[default]
    Forward,
    /// From value `N` down to 1.
    Backward,
}

impl Direction {
    /// Returns the other direction.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Parameters of a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Stop after finding this many solutions.
    pub cap: usize,
    /// Order in which values are placed.
    pub direction: Direction,
    /// Shuffle candidate cells with a generator seeded from this value.
    ///
    /// `None` selects the deterministic order: fewest onward options first,
    /// ties broken by row-major position.
    pub shuffle_seed: Option<u64>,
}

impl SearchConfig {
    /// Deterministic forward search stopping at `cap` solutions.
    #[must_use]
    pub const fn capped(cap: usize) -> Self {
        Self {
            cap,
            direction: Direction::Forward,
            shuffle_seed: None,
        }
    }

    /// Sets the direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Enables randomized neighbour ordering.
    #[must_use]
    pub const fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SearchStatus {
    /// The whole search space was explored; the solutions found are all there are.
    Complete,
    /// The solution cap was reached.
    Capped,
    /// The deadline expired first.
    TimedOut,
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// How the search ended.
    pub status: SearchStatus,
    /// Distinct solutions found, in discovery order.
    pub solutions: Vec<Solution>,
    /// Number of visited search nodes.
    pub nodes: u64,
}

impl SearchOutcome {
    /// Returns `true` if the outcome proves the puzzle has at most the found solutions.
    #[must_use]
    pub fn is_definitive(&self) -> bool {
        !self.status.is_timed_out()
    }
}

/// Searches for up to `config.cap` solutions of `puzzle` before `deadline`.
///
/// # Examples
///
/// ```
/// use hidato_core::Adjacency;
/// use hidato_solver::{Deadline, Puzzle, SearchConfig, SearchStatus, search};
///
/// let puzzle = Puzzle::new("1 . . / . . .".parse()?, Adjacency::Four)?;
/// let outcome = search(&puzzle, SearchConfig::capped(usize::MAX), Deadline::never());
/// assert_eq!(outcome.status, SearchStatus::Complete);
/// assert_eq!(outcome.solutions.len(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn search(puzzle: &Puzzle, config: SearchConfig, deadline: Deadline) -> SearchOutcome {
    match config.direction {
        Direction::Forward => Search::new(puzzle, config, deadline).run(),
        Direction::Backward => {
            let mut outcome = Search::new(&puzzle.reversed(), config, deadline).run();
            for solution in &mut outcome.solutions {
                *solution = solution.reversed();
            }
            outcome
        }
    }
}

/// Returns one solution of `puzzle`, if one is found before `deadline`.
#[must_use]
pub fn solve(puzzle: &Puzzle, deadline: Deadline) -> Option<Solution> {
    search(puzzle, SearchConfig::capped(1), deadline)
        .solutions
        .into_iter()
        .next()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
struct SearchState {
    cell_value: Vec<u32>,
    value_cell: Vec<usize>,
    free: usize,
}

#[derive(Debug)]
struct Search {
    adjacency: Adjacency,
    max_value: u32,
    positions: Vec<Position>,
    neighbors: Vec<Vec<usize>>,
    given: Vec<bool>,
    /// `next_given[v]` is the smallest given value above `v` and its cell.
    next_given: Vec<Option<(u32, usize)>>,
    /// `givens_above[v]` is the number of givens with a value above `v`.
    givens_above: Vec<usize>,
    state: SearchState,
    cap: usize,
    deadline: Deadline,
    rng: Option<Pcg64>,
    solutions: Vec<Solution>,
    nodes: u64,
    timed_out: bool,
    stamp: Vec<u32>,
    epoch: u32,
    stack: Vec<usize>,
}

impl Search {
    fn new(puzzle: &Puzzle, config: SearchConfig, deadline: Deadline) -> Self {
        let grid = puzzle.grid();
        let adjacency = puzzle.adjacency();
        let max_value = puzzle.max_value();
        let cell_count = grid.cell_count();

        let positions = grid.positions().collect::<Vec<_>>();
        let neighbors = positions
            .iter()
            .map(|&pos| {
                if grid.is_open(pos) {
                    grid.open_neighbors(pos, adjacency)
                        .into_iter()
                        .map(|p| grid.index(p))
                        .collect()
                } else {
                    Vec::new()
                }
            })
            .collect::<Vec<Vec<usize>>>();

        let mut cell_value = vec![0; cell_count];
        let mut value_cell = vec![UNASSIGNED; max_value as usize];
        let mut given = vec![false; cell_count];
        for pos in grid.blocked_positions() {
            cell_value[grid.index(pos)] = u32::MAX;
        }
        for (value, pos) in puzzle.givens() {
            let i = grid.index(pos);
            cell_value[i] = value;
            value_cell[value as usize - 1] = i;
            given[i] = true;
        }

        let mut next_given = vec![None; max_value as usize + 1];
        let mut givens_above = vec![0; max_value as usize + 1];
        let mut upcoming = None;
        let mut count = 0;
        for value in (0..=max_value).rev() {
            next_given[value as usize] = upcoming;
            givens_above[value as usize] = count;
            if value > 0 && value_cell[value as usize - 1] != UNASSIGNED {
                upcoming = Some((value, value_cell[value as usize - 1]));
                count += 1;
            }
        }

        Self {
            adjacency,
            max_value,
            positions,
            neighbors,
            given,
            next_given,
            givens_above,
            state: SearchState {
                cell_value,
                value_cell,
                free: puzzle.open_count() - puzzle.clue_count(),
            },
            cap: config.cap.max(1),
            deadline,
            rng: config.shuffle_seed.map(Pcg64::seed_from_u64),
            solutions: Vec::new(),
            nodes: 0,
            timed_out: false,
            stamp: vec![0; cell_count],
            epoch: 0,
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> SearchOutcome {
        if self.deadline.is_expired() {
            self.timed_out = true;
        } else if self.givens_feasible() {
            let first = self.state.value_cell[0];
            if first == UNASSIGNED {
                let mut starts = (0..self.positions.len())
                    .filter(|&c| self.state.cell_value[c] == 0 && self.within_reach(c, 1))
                    .collect::<Vec<_>>();
                self.order(&mut starts);
                for cell in starts {
                    if self.try_place(cell, 1) == Flow::Stop {
                        break;
                    }
                }
            } else {
                let _ = self.descend(1);
            }
        }

        let status = if self.timed_out {
            SearchStatus::TimedOut
        } else if self.solutions.len() >= self.cap {
            SearchStatus::Capped
        } else {
            SearchStatus::Complete
        };
        trace!(
            "search finished: status={status:?}, solutions={}, nodes={}",
            self.solutions.len(),
            self.nodes
        );
        SearchOutcome {
            status,
            solutions: self.solutions,
            nodes: self.nodes,
        }
    }

    /// Checks that consecutive givens can be joined in exactly their value gap.
    fn givens_feasible(&self) -> bool {
        let mut previous: Option<(u32, usize)> = None;
        for (value, &cell) in (1..).zip(&self.state.value_cell) {
            if cell == UNASSIGNED {
                continue;
            }
            if let Some((pv, pc)) = previous
                && !self
                    .adjacency
                    .can_reach(self.positions[pc], self.positions[cell], value - pv)
            {
                return false;
            }
            previous = Some((value, cell));
        }
        true
    }

    fn descend(&mut self, last: u32) -> Flow {
        self.nodes += 1;
        if self.nodes.is_multiple_of(DEADLINE_CHECK_INTERVAL) && self.deadline.is_expired() {
            self.timed_out = true;
            return Flow::Stop;
        }
        if last == self.max_value {
            self.record();
            return if self.solutions.len() >= self.cap {
                Flow::Stop
            } else {
                Flow::Continue
            };
        }

        let next = last + 1;
        let from = self.state.value_cell[last as usize - 1];
        let fixed = self.state.value_cell[next as usize - 1];
        if fixed != UNASSIGNED {
            return if self
                .adjacency
                .are_adjacent(self.positions[from], self.positions[fixed])
            {
                self.descend(next)
            } else {
                Flow::Continue
            };
        }

        let mut candidates = self.neighbors[from]
            .iter()
            .copied()
            .filter(|&c| self.state.cell_value[c] == 0 && self.within_reach(c, next))
            .collect::<Vec<_>>();
        self.order(&mut candidates);
        for cell in candidates {
            if self.try_place(cell, next) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn try_place(&mut self, cell: usize, value: u32) -> Flow {
        self.assign(cell, value);
        let flow = if self.remaining_reachable(cell, value) {
            self.descend(value)
        } else {
            Flow::Continue
        };
        self.unassign(cell, value);
        flow
    }

    fn assign(&mut self, cell: usize, value: u32) {
        debug_assert!(!self.given[cell]);
        self.state.cell_value[cell] = value;
        self.state.value_cell[value as usize - 1] = cell;
        self.state.free -= 1;
    }

    fn unassign(&mut self, cell: usize, value: u32) {
        self.state.cell_value[cell] = 0;
        self.state.value_cell[value as usize - 1] = UNASSIGNED;
        self.state.free += 1;
    }

    /// Returns `true` if placing `value` at `cell` leaves the next given reachable in time.
    fn within_reach(&self, cell: usize, value: u32) -> bool {
        match self.next_given[value as usize] {
            Some((gv, gc)) => {
                self.adjacency
                    .can_reach(self.positions[cell], self.positions[gc], gv - value)
            }
            None => true,
        }
    }

    /// Returns `true` if every unfilled cell and every given above `value` can
    /// still be reached from `head`.
    fn remaining_reachable(&mut self, head: usize, value: u32) -> bool {
        let pending_givens = self.givens_above[value as usize];
        if self.state.free == 0 && pending_givens == 0 {
            return true;
        }
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.fill(0);
            self.epoch = 1;
        }
        let epoch = self.epoch;
        self.stamp[head] = epoch;
        self.stack.clear();
        self.stack.push(head);
        let mut free_seen = 0;
        let mut givens_seen = 0;
        while let Some(cell) = self.stack.pop() {
            for &next in &self.neighbors[cell] {
                if self.stamp[next] == epoch {
                    continue;
                }
                let v = self.state.cell_value[next];
                if v == 0 {
                    free_seen += 1;
                } else if v > value && v != u32::MAX {
                    givens_seen += 1;
                } else {
                    continue;
                }
                self.stamp[next] = epoch;
                self.stack.push(next);
            }
        }
        free_seen == self.state.free && givens_seen == pending_givens
    }

    fn order(&mut self, candidates: &mut [usize]) {
        if let Some(rng) = &mut self.rng {
            candidates.shuffle(rng);
        } else {
            let state = &self.state;
            let neighbors = &self.neighbors;
            candidates.sort_by_key(|&c| {
                let onward = neighbors[c]
                    .iter()
                    .filter(|&&n| state.cell_value[n] == 0)
                    .count();
                (onward, c)
            });
        }
    }

    fn record(&mut self) {
        let positions = self
            .state
            .value_cell
            .iter()
            .map(|&c| self.positions[c])
            .collect();
        self.solutions.push(Solution::new(positions));
    }
}

#[cfg(test)]
mod tests {
    use hidato_core::Grid;
    use proptest::prelude::*;

    use super::*;

    fn puzzle(text: &str, adjacency: Adjacency) -> Puzzle {
        Puzzle::new(text.parse().unwrap(), adjacency).unwrap()
    }

    fn count(puzzle: &Puzzle) -> usize {
        let outcome = search(puzzle, SearchConfig::capped(usize::MAX), Deadline::never());
        assert_eq!(outcome.status, SearchStatus::Complete);
        outcome.solutions.len()
    }

    #[test]
    fn test_unique_strip() {
        let p = puzzle("1 . . . 5", Adjacency::Four);
        let outcome = search(&p, SearchConfig::capped(2), Deadline::never());
        assert_eq!(outcome.status, SearchStatus::Complete);
        assert_eq!(outcome.solutions.len(), 1);
        assert!(p.is_solution(&outcome.solutions[0]));
    }

    #[test]
    fn test_counts_open_2x2_paths() {
        // A 2x2 board has 8 Hamiltonian paths under the 4-rule (4 starts x 2 directions).
        assert_eq!(count(&puzzle(". . / . .", Adjacency::Four)), 8);
        // Under the 8-rule any ordering works: 4! = 24.
        assert_eq!(count(&puzzle(". . / . .", Adjacency::Eight)), 24);
    }

    #[test]
    fn test_infeasible_givens_short_circuit() {
        let p = puzzle("1 . 2 / . . .", Adjacency::Four);
        let outcome = search(&p, SearchConfig::capped(2), Deadline::never());
        assert_eq!(outcome.status, SearchStatus::Complete);
        assert!(outcome.solutions.is_empty());
    }

    #[test]
    fn test_cap_stops_early() {
        let p = puzzle(". . . / . . . / . . .", Adjacency::Four);
        let outcome = search(&p, SearchConfig::capped(2), Deadline::never());
        assert_eq!(outcome.status, SearchStatus::Capped);
        assert_eq!(outcome.solutions.len(), 2);
        assert_ne!(outcome.solutions[0], outcome.solutions[1]);
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let p = puzzle(". . . / . . . / . . .", Adjacency::Four);
        let outcome = search(&p, SearchConfig::capped(2), Deadline::expired());
        assert_eq!(outcome.status, SearchStatus::TimedOut);
        assert!(!outcome.is_definitive());
    }

    #[test]
    fn test_backward_finds_same_solution_set() {
        let p = puzzle("1 . . / . . . / . . 9", Adjacency::Four);
        let mut forward = search(&p, SearchConfig::capped(usize::MAX), Deadline::never()).solutions;
        let mut backward = search(
            &p,
            SearchConfig::capped(usize::MAX).with_direction(Direction::Backward),
            Deadline::never(),
        )
        .solutions;
        forward.sort_by(|a, b| a.positions().cmp(b.positions()));
        backward.sort_by(|a, b| a.positions().cmp(b.positions()));
        assert_eq!(forward, backward);
        assert!(!forward.is_empty());
        assert!(forward.iter().all(|s| p.is_solution(s)));
    }

    #[test]
    fn test_solve_blocked_board() {
        let p = puzzle("1 . # / . . . / # . 7", Adjacency::Eight);
        let solution = solve(&p, Deadline::never()).unwrap();
        assert!(p.is_solution(&solution));
    }

    #[test]
    fn test_colour_imbalance_has_no_solution() {
        // Both ends sit on the colour with three open cells; seven cells need four.
        let p = puzzle("1 . # / . . . / # . 7", Adjacency::Four);
        let outcome = search(&p, SearchConfig::capped(1), Deadline::never());
        assert_eq!(outcome.status, SearchStatus::Complete);
        assert!(outcome.solutions.is_empty());
        assert_eq!(solve(&p, Deadline::never()), None);
    }

    proptest! {
        #[test]
        fn test_shuffled_search_agrees_on_count(seed in any::<u64>(), clue in 2u32..12) {
            let grid = Grid::new(3, 4).unwrap();
            let serpentine = (0..3u8)
                .flat_map(|r| {
                    let cols: Vec<u8> = if r % 2 == 0 { (0..4).collect() } else { (0..4).rev().collect() };
                    cols.into_iter().map(move |c| Position::new(r, c))
                })
                .collect::<Vec<_>>();
            let solution = Solution::new(serpentine);
            let p = Puzzle::from_solution(&grid, Adjacency::Four, &solution, [1, clue, 12]).unwrap();
            let baseline = count(&p);
            let shuffled = search(
                &p,
                SearchConfig::capped(usize::MAX).with_shuffle_seed(seed),
                Deadline::never(),
            );
            prop_assert_eq!(shuffled.status, SearchStatus::Complete);
            prop_assert_eq!(shuffled.solutions.len(), baseline);
            prop_assert!(baseline >= 1);
        }
    }
}
