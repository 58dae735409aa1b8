use crate::Position;

/// The state of a single cell.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    derive_more::IsVariant,
)]
pub enum CellState {
    /// An open cell the solver has to fill.
    #[default]
    Empty,
    /// An open cell whose value is revealed to the player.
    Given(u32),
    /// A cell that is not part of the board.
    Blocked,
}

impl CellState {
    /// Returns the given value, if any.
    #[must_use]
    #[inline]
    pub const fn value(self) -> Option<u32> {
        match self {
            Self::Given(value) => Some(value),
            Self::Empty | Self::Blocked => None,
        }
    }

    /// Returns `true` for cells that belong to the board (empty or given).
    #[must_use]
    #[inline]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// A cell together with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    /// Where the cell is.
    pub position: Position,
    /// What the cell holds.
    pub state: CellState,
}
