use std::collections::HashSet;

use hidato_core::{Adjacency, CellState, Constraints, Grid, GridError, Position};

use crate::signature::SignatureBuilder;

/// Errors raised when a grid cannot hold a puzzle.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum PuzzleError {
    /// The board shape cannot hold a path.
    #[display("invalid board shape: {_0}")]
    Shape(#[from] GridError),
    /// A given lies outside `1..=N`.
    #[display("given {value} at {position} is outside 1..={max}")]
    ValueOutOfRange {
        /// The offending value.
        value: u32,
        /// Where it was found.
        position: Position,
        /// The largest allowed value.
        max: u32,
    },
    /// The same value is given twice.
    #[display("value {value} is given more than once")]
    DuplicateValue {
        /// The repeated value.
        value: u32,
    },
    /// A solution does not cover the open cells of the grid it was applied to.
    #[display("solution does not match the open cells of the grid")]
    SolutionMismatch,
}

/// A filled path: `positions()[v - 1]` holds value `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Solution {
    positions: Vec<Position>,
}

impl Solution {
    /// Creates a solution from cells ordered by value.
    #[must_use]
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    /// Returns the cells ordered by value.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Returns the number of values, which is also the largest value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` for the empty solution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the cell holding `value`.
    #[must_use]
    pub fn position_of(&self, value: u32) -> Option<Position> {
        let index = usize::try_from(value).ok()?.checked_sub(1)?;
        self.positions.get(index).copied()
    }

    /// Returns the value at `pos`, if the solution covers it.
    #[must_use]
    pub fn value_at(&self, pos: Position) -> Option<u32> {
        self.positions
            .iter()
            .position(|&p| p == pos)
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Returns the same path walked from the other end.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            positions: self.positions.iter().rev().copied().collect(),
        }
    }

    /// Returns `grid` with every covered cell holding its value.
    #[must_use]
    pub fn fill(&self, grid: &Grid) -> Grid {
        let mut out = grid.clone();
        for (value, &pos) in (1..).zip(&self.positions) {
            out.set(pos, CellState::Given(value));
        }
        out
    }
}

/// A Hidato puzzle: a board shape, its givens, and an adjacency rule.
///
/// Every open cell has to receive one value from `1..=N`, where `N` is the
/// number of open cells, such that consecutive values sit on neighbouring
/// cells and every given keeps its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    grid: Grid,
    adjacency: Adjacency,
    max_value: u32,
    givens: Vec<Option<Position>>,
}

impl Puzzle {
    /// Creates a puzzle from a grid holding givens and blocked cells.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::Shape`] if the open cells are missing or
    /// disconnected, and a value error if a given is outside `1..=N` or a
    /// value is given twice.
    pub fn new(grid: Grid, adjacency: Adjacency) -> Result<Self, PuzzleError> {
        let constraints = Constraints::new(adjacency);
        constraints.check(&grid)?;
        let max_value = *constraints.value_range(&grid).end();
        let mut givens = vec![None; grid.open_count()];
        for (position, value) in grid.givens() {
            if value == 0 || value > max_value {
                return Err(PuzzleError::ValueOutOfRange {
                    value,
                    position,
                    max: max_value,
                });
            }
            let slot = &mut givens[value as usize - 1];
            if slot.is_some() {
                return Err(PuzzleError::DuplicateValue { value });
            }
            *slot = Some(position);
        }
        Ok(Self {
            grid,
            adjacency,
            max_value,
            givens,
        })
    }

    /// Creates a puzzle on the shape of `shape` revealing `clues` of `solution`.
    ///
    /// Givens already present in `shape` are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`PuzzleError::SolutionMismatch`] if the solution does not cover
    /// exactly the open cells of `shape`, or if a clue is not a value of the
    /// solution.
    pub fn from_solution<I>(
        shape: &Grid,
        adjacency: Adjacency,
        solution: &Solution,
        clues: I,
    ) -> Result<Self, PuzzleError>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut grid = shape.without_givens();
        let covered = solution.positions().iter().copied().collect::<HashSet<_>>();
        if covered.len() != solution.len()
            || covered.len() != grid.open_count()
            || covered.iter().any(|&pos| !grid.is_open(pos))
        {
            return Err(PuzzleError::SolutionMismatch);
        }
        for value in clues {
            let pos = solution
                .position_of(value)
                .ok_or(PuzzleError::SolutionMismatch)?;
            grid.set(pos, CellState::Given(value));
        }
        Self::new(grid, adjacency)
    }

    /// Returns the board with its givens.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Returns the adjacency rule.
    #[must_use]
    pub fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Returns `N`, the largest value.
    #[must_use]
    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Returns the number of open cells.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.givens.len()
    }

    /// Returns where `value` is given, if it is.
    #[must_use]
    pub fn given_position(&self, value: u32) -> Option<Position> {
        let index = usize::try_from(value).ok()?.checked_sub(1)?;
        self.givens.get(index).copied().flatten()
    }

    /// Iterates over `(value, position)` of every given in increasing value order.
    pub fn givens(&self) -> impl Iterator<Item = (u32, Position)> + '_ {
        (1..)
            .zip(&self.givens)
            .filter_map(|(value, pos)| pos.map(|pos| (value, pos)))
    }

    /// Iterates over the given values in increasing order.
    pub fn clues(&self) -> impl Iterator<Item = u32> + '_ {
        self.givens().map(|(value, _)| value)
    }

    /// Returns the number of givens.
    #[must_use]
    pub fn clue_count(&self) -> usize {
        self.givens.iter().flatten().count()
    }

    /// Returns a copy without the given `value`. Unknown values are ignored.
    #[must_use]
    pub fn without_clue(&self, value: u32) -> Self {
        let mut out = self.clone();
        if let Some(pos) = self.given_position(value) {
            out.grid.set(pos, CellState::Empty);
            out.givens[value as usize - 1] = None;
        }
        out
    }

    /// Returns the same puzzle with every value `v` replaced by `N + 1 - v`.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut grid = self.grid.clone();
        let mut givens = vec![None; self.givens.len()];
        for (value, pos) in self.givens() {
            let mirrored = self.max_value + 1 - value;
            grid.set(pos, CellState::Given(mirrored));
            givens[mirrored as usize - 1] = Some(pos);
        }
        Self {
            grid,
            adjacency: self.adjacency,
            max_value: self.max_value,
            givens,
        }
    }

    /// Returns `true` if `solution` is a valid completion of this puzzle.
    #[must_use]
    pub fn is_solution(&self, solution: &Solution) -> bool {
        if solution.len() != self.open_count() {
            return false;
        }
        let mut seen = HashSet::with_capacity(solution.len());
        for &pos in solution.positions() {
            if !self.grid.is_open(pos) || !seen.insert(pos) {
                return false;
            }
        }
        let adjacent = solution
            .positions()
            .windows(2)
            .all(|w| self.adjacency.are_adjacent(w[0], w[1]));
        adjacent
            && self
                .givens()
                .all(|(value, pos)| solution.position_of(value) == Some(pos))
    }

    /// Returns a stable signature of the givens and the adjacency rule.
    #[must_use]
    pub fn givens_signature(&self) -> u64 {
        let adjacency = u32::try_from(self.adjacency.max_degree()).unwrap_or(0);
        self.givens()
            .fold(
                SignatureBuilder::new("givens").u32(adjacency),
                |sig, (value, pos)| sig.u32(value).position(pos),
            )
            .finish()
    }

    /// Returns a stable signature of the board shape (size and blocked cells).
    #[must_use]
    pub fn mask_signature(&self) -> u64 {
        let rows = u32::try_from(self.grid.rows()).unwrap_or(0);
        let cols = u32::try_from(self.grid.cols()).unwrap_or(0);
        self.grid
            .blocked_positions()
            .fold(SignatureBuilder::new("shape").u32(rows).u32(cols), |sig, pos| {
                sig.position(pos)
            })
            .finish()
    }
}
