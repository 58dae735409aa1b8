use std::{
    fmt::{self, Display},
    str::FromStr,
};

use tinyvec::ArrayVec;

use crate::{Adjacency, Cell, CellState, GridError, Position};

/// Neighbour list of a single cell, at most eight entries.
pub type Neighbors = ArrayVec<[Position; 8]>;

/// A rectangular Hidato board.
///
/// Irregular shapes are expressed with [`CellState::Blocked`] cells. A grid owns
/// no path or solution state; the values it holds are the givens of a puzzle.
///
/// # Text format
///
/// [`Display`] and [`FromStr`] use one token per cell: `.` for an empty cell,
/// `#` for a blocked cell, and a positive number for a given. Rows are
/// separated by newlines or `/`.
///
/// ```
/// use hidato_core::Grid;
///
/// let grid: Grid = "
///     1 . #
///     . . 5
/// "
/// .parse()?;
/// assert_eq!(grid.cols(), 3);
/// assert_eq!(grid.givens().count(), 2);
/// # Ok::<(), hidato_core::GridError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    rows: u8,
    cols: u8,
    cells: Vec<CellState>,
}

impl Grid {
    /// Largest supported side length.
    pub const MAX_SIDE: u8 = 64;

    /// Creates a grid of empty cells.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if a side is zero or larger
    /// than [`Grid::MAX_SIDE`].
    #[expect(clippy::cast_possible_truncation)]
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        let max = usize::from(Self::MAX_SIDE);
        if rows == 0 || cols == 0 || rows > max || cols > max {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows: rows as u8,
            cols: cols as u8,
            cells: vec![CellState::Empty; rows * cols],
        })
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        usize::from(self.rows)
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        usize::from(self.cols)
    }

    /// Returns the shorter side length.
    #[must_use]
    pub fn min_side(&self) -> usize {
        self.rows().min(self.cols())
    }

    /// Returns the total number of cells, blocked cells included.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if `pos` lies on the board.
    #[must_use]
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row() < self.rows && pos.col() < self.cols
    }

    /// Returns the row-major index of `pos`.
    #[must_use]
    #[inline]
    pub fn index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "{pos} outside {}x{}", self.rows, self.cols);
        usize::from(pos.row()) * self.cols() + usize::from(pos.col())
    }

    /// Returns the position at row-major `index`.
    #[must_use]
    #[inline]
    #[expect(clippy::cast_possible_truncation)]
    pub fn position(&self, index: usize) -> Position {
        debug_assert!(index < self.cells.len());
        Position::new((index / self.cols()) as u8, (index % self.cols()) as u8)
    }

    /// Iterates over every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(|i| self.position(i))
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().enumerate().map(|(i, &state)| Cell {
            position: self.position(i),
            state,
        })
    }

    /// Returns the state of the cell at `pos`.
    #[must_use]
    #[inline]
    pub fn cell(&self, pos: Position) -> CellState {
        self.cells[self.index(pos)]
    }

    /// Sets the state of the cell at `pos`.
    #[inline]
    pub fn set(&mut self, pos: Position, state: CellState) {
        let i = self.index(pos);
        self.cells[i] = state;
    }

    /// Returns `true` if `pos` is on the board and not blocked.
    #[must_use]
    #[inline]
    pub fn is_open(&self, pos: Position) -> bool {
        self.contains(pos) && self.cell(pos).is_open()
    }

    /// Iterates over non-blocked positions in row-major order.
    pub fn open_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter(|cell| cell.state.is_open())
            .map(|cell| cell.position)
    }

    /// Iterates over blocked positions in row-major order.
    pub fn blocked_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter(|cell| cell.state.is_blocked())
            .map(|cell| cell.position)
    }

    /// Returns the number of non-blocked cells.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|state| state.is_open()).count()
    }

    /// Iterates over `(position, value)` for every given cell.
    pub fn givens(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        self.cells()
            .filter_map(|cell| cell.state.value().map(|value| (cell.position, value)))
    }

    /// Returns the on-board neighbours of `pos`, blocked cells included.
    #[must_use]
    pub fn neighbors(&self, pos: Position, adjacency: Adjacency) -> Neighbors {
        let mut out = Neighbors::new();
        for &(dr, dc) in adjacency.offsets() {
            if let Some(next) = pos.offset(dr, dc)
                && self.contains(next)
            {
                out.push(next);
            }
        }
        out
    }

    /// Returns the non-blocked neighbours of `pos`.
    #[must_use]
    pub fn open_neighbors(&self, pos: Position, adjacency: Adjacency) -> Neighbors {
        let mut out = self.neighbors(pos, adjacency);
        out.retain(|p| self.cell(*p).is_open());
        out
    }

    /// Returns a copy of this grid with every position in `cells` blocked.
    #[must_use]
    pub fn with_blocked<I>(&self, cells: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut grid = self.clone();
        for pos in cells {
            grid.set(pos, CellState::Blocked);
        }
        grid
    }

    /// Returns a copy of this grid with every given cleared to empty.
    #[must_use]
    pub fn without_givens(&self) -> Self {
        let mut grid = self.clone();
        for state in &mut grid.cells {
            if state.is_given() {
                *state = CellState::Empty;
            }
        }
        grid
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .givens()
            .map(|(_, value)| value.to_string().len())
            .max()
            .unwrap_or(1);
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.cols {
                if col > 0 {
                    f.write_str(" ")?;
                }
                match self.cell(Position::new(row, col)) {
                    CellState::Empty => write!(f, "{:>width$}", ".")?,
                    CellState::Blocked => write!(f, "{:>width$}", "#")?,
                    CellState::Given(value) => write!(f, "{value:>width$}")?,
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .split(['\n', '/'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.split_whitespace()
                    .map(parse_token)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let expected = rows.first().map_or(0, Vec::len);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(GridError::RaggedRow {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }
        let mut grid = Self::new(rows.len(), expected)?;
        grid.cells = rows.into_iter().flatten().collect();
        Ok(grid)
    }
}

fn parse_token(token: &str) -> Result<CellState, GridError> {
    match token {
        "." | "_" => Ok(CellState::Empty),
        "#" => Ok(CellState::Blocked),
        _ => match token.parse::<u32>() {
            Ok(value) if value > 0 => Ok(CellState::Given(value)),
            _ => Err(GridError::InvalidToken(token.to_owned())),
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_new_rejects_zero_and_oversized() {
        assert!(Grid::new(0, 3).is_err());
        assert!(Grid::new(3, 65).is_err());
        assert!(Grid::new(64, 64).is_ok());
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let text = " 1  .  #\n .  . 12";
        let grid: Grid = text.parse().unwrap();
        assert_eq!(grid.cell(Position::new(0, 0)), CellState::Given(1));
        assert_eq!(grid.cell(Position::new(0, 2)), CellState::Blocked);
        assert_eq!(grid.cell(Position::new(1, 2)), CellState::Given(12));
        assert_eq!(grid.to_string(), text);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = "1 . . / . .".parse::<Grid>().unwrap_err();
        assert_eq!(
            err,
            GridError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_parse_rejects_zero_value() {
        assert!(matches!(
            "0 .".parse::<Grid>(),
            Err(GridError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_corner_neighbors() {
        let grid = Grid::new(3, 3).unwrap();
        assert_eq!(grid.neighbors(Position::new(0, 0), Adjacency::Four).len(), 2);
        assert_eq!(grid.neighbors(Position::new(0, 0), Adjacency::Eight).len(), 3);
        assert_eq!(grid.neighbors(Position::new(1, 1), Adjacency::Eight).len(), 8);
    }

    #[test]
    fn test_with_blocked_leaves_original_untouched() {
        let grid = Grid::new(3, 3).unwrap();
        let blocked = grid.with_blocked([Position::new(1, 1)]);
        assert_eq!(grid.open_count(), 9);
        assert_eq!(blocked.open_count(), 8);
        assert_eq!(
            blocked
                .open_neighbors(Position::new(0, 1), Adjacency::Four)
                .len(),
            2
        );
    }

    proptest! {
        #[test]
        fn test_index_position_round_trip(rows in 1usize..20, cols in 1usize..20, seed in any::<usize>()) {
            let grid = Grid::new(rows, cols).unwrap();
            let index = seed % grid.cell_count();
            prop_assert_eq!(grid.index(grid.position(index)), index);
        }
    }
}
