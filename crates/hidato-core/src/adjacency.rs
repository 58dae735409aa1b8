use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{GridError, Position};

const FOUR: [(i8, i8); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const EIGHT: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// The rule deciding which cells are neighbours.
///
/// Consecutive values of a Hidato path must sit on neighbouring cells.
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
pub enum Adjacency {
    /// Orthogonal neighbours only.
    #[default]
    Four,
    /// Orthogonal and diagonal neighbours.
    Eight,
}

impl Adjacency {
    /// Returns the neighbour offsets in row-major order.
    #[must_use]
    pub const fn offsets(self) -> &'static [(i8, i8)] {
        match self {
            Self::Four => &FOUR,
            Self::Eight => &EIGHT,
        }
    }

    /// Returns the maximum number of neighbours a cell can have.
    #[must_use]
    pub const fn max_degree(self) -> usize {
        self.offsets().len()
    }

    /// Returns `true` if `a` and `b` are distinct neighbours under this rule.
    #[must_use]
    #[inline]
    pub fn are_adjacent(self, a: Position, b: Position) -> bool {
        a != b && self.distance(a, b) == 1
    }

    /// Returns the number of steps between `a` and `b` on an obstacle-free board.
    ///
    /// This is the Manhattan distance for [`Adjacency::Four`] and the Chebyshev
    /// distance for [`Adjacency::Eight`]. It is a lower bound on the number of
    /// path steps between two cells.
    #[must_use]
    #[inline]
    pub fn distance(self, a: Position, b: Position) -> u32 {
        let dr = u32::from(a.row().abs_diff(b.row()));
        let dc = u32::from(a.col().abs_diff(b.col()));
        match self {
            Self::Four => dr + dc,
            Self::Eight => dr.max(dc),
        }
    }

    /// Returns `true` if a walk of exactly `steps` moves can lead from `a` to `b`
    /// on an obstacle-free board.
    ///
    /// Under [`Adjacency::Four`] the board is bipartite, so the step count must
    /// also match the parity of the distance.
    #[must_use]
    #[inline]
    pub fn can_reach(self, a: Position, b: Position, steps: u32) -> bool {
        let distance = self.distance(a, b);
        match self {
            Self::Four => distance <= steps && (steps - distance).is_multiple_of(2),
            Self::Eight => distance <= steps && (a != b || steps != 1),
        }
    }
}

impl Display for Adjacency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Four => f.write_str("4"),
            Self::Eight => f.write_str("8"),
        }
    }
}

impl FromStr for Adjacency {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "four" => Ok(Self::Four),
            "8" | "eight" => Ok(Self::Eight),
            _ => Err(GridError::UnknownAdjacency(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_four_is_manhattan() {
        let a = Position::new(0, 0);
        let b = Position::new(2, 3);
        assert_eq!(Adjacency::Four.distance(a, b), 5);
        assert_eq!(Adjacency::Eight.distance(a, b), 3);
    }

    #[test]
    fn test_diagonal_adjacency() {
        let a = Position::new(1, 1);
        let b = Position::new(2, 2);
        assert!(!Adjacency::Four.are_adjacent(a, b));
        assert!(Adjacency::Eight.are_adjacent(a, b));
        assert!(!Adjacency::Eight.are_adjacent(a, a));
    }

    #[test]
    fn test_can_reach_respects_parity() {
        let a = Position::new(0, 0);
        let b = Position::new(1, 1);
        assert!(Adjacency::Four.can_reach(a, b, 2));
        assert!(!Adjacency::Four.can_reach(a, b, 3));
        assert!(Adjacency::Four.can_reach(a, b, 4));
        assert!(Adjacency::Eight.can_reach(a, b, 1));
        assert!(Adjacency::Eight.can_reach(a, b, 2));
        assert!(!Adjacency::Eight.can_reach(a, a, 1));
    }

    #[test]
    fn test_parse() {
        assert_eq!("8".parse::<Adjacency>().unwrap(), Adjacency::Eight);
        assert_eq!("Four".parse::<Adjacency>().unwrap(), Adjacency::Four);
        assert!("6".parse::<Adjacency>().is_err());
    }
}
