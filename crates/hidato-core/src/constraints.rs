use std::ops::RangeInclusive;

use crate::{Adjacency, Grid, GridError, connectivity};

/// Rules a board has to satisfy to hold a puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Constraints {
    /// Neighbour rule for consecutive values.
    pub adjacency: Adjacency,
    /// Whether open cells must form a single connected component.
    pub require_connected: bool,
}

impl Constraints {
    /// Creates constraints requiring a connected board.
    #[must_use]
    pub const fn new(adjacency: Adjacency) -> Self {
        Self {
            adjacency,
            require_connected: true,
        }
    }

    /// Returns the values a puzzle on `grid` uses: `1..=open cells`.
    #[must_use]
    pub fn value_range(&self, grid: &Grid) -> RangeInclusive<u32> {
        let max = u32::try_from(grid.open_count()).unwrap_or(u32::MAX);
        1..=max
    }

    /// Checks that `grid` can host a path under these constraints.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NoOpenCells`] for a fully blocked board and
    /// [`GridError::Disconnected`] when connectivity is required but violated.
    pub fn check(&self, grid: &Grid) -> Result<(), GridError> {
        if grid.open_count() == 0 {
            return Err(GridError::NoOpenCells);
        }
        if self.require_connected {
            let components = connectivity::open_components(grid, self.adjacency).len();
            if components != 1 {
                return Err(GridError::Disconnected { components });
            }
        }
        Ok(())
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self::new(Adjacency::default())
    }
}
