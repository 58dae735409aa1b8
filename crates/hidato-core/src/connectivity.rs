//! Flood-fill based connectivity analysis.
//!
//! Used to validate block masks, structural repairs, and partial-path boards:
//! every accepted board keeps its open cells in a single component.

use std::collections::VecDeque;

use crate::{Adjacency, Grid, Position};

/// Marks every cell reachable from `start` through cells accepted by `passable`.
///
/// The returned vector is indexed by [`Grid::index`]. `start` is marked even if
/// `passable` rejects it.
pub fn flood_fill<F>(grid: &Grid, adjacency: Adjacency, start: Position, mut passable: F) -> Vec<bool>
where
    F: FnMut(Position) -> bool,
{
    let mut seen = vec![false; grid.cell_count()];
    seen[grid.index(start)] = true;
    let mut queue = VecDeque::from([start]);
    while let Some(pos) = queue.pop_front() {
        for next in grid.neighbors(pos, adjacency) {
            let i = grid.index(next);
            if !seen[i] && passable(next) {
                seen[i] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

/// Splits the cells accepted by `passable` into connected components.
///
/// Components are returned in the row-major order of their first cell, and
/// each component lists its cells in discovery order.
pub fn components<F>(grid: &Grid, adjacency: Adjacency, mut passable: F) -> Vec<Vec<Position>>
where
    F: FnMut(Position) -> bool,
{
    let mut seen = vec![false; grid.cell_count()];
    let mut out = Vec::new();
    for start in grid.positions() {
        let i = grid.index(start);
        if seen[i] || !passable(start) {
            continue;
        }
        seen[i] = true;
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            for next in grid.neighbors(pos, adjacency) {
                let j = grid.index(next);
                if !seen[j] && passable(next) {
                    seen[j] = true;
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }
        out.push(component);
    }
    out
}

/// Returns the connected components of the open cells of `grid`.
#[must_use]
pub fn open_components(grid: &Grid, adjacency: Adjacency) -> Vec<Vec<Position>> {
    components(grid, adjacency, |pos| grid.cell(pos).is_open())
}

/// Returns `true` if the open cells of `grid` form exactly one component.
#[must_use]
pub fn is_connected(grid: &Grid, adjacency: Adjacency) -> bool {
    let Some(start) = grid.open_positions().next() else {
        return false;
    };
    let reached = flood_fill(grid, adjacency, start, |pos| grid.is_open(pos))
        .into_iter()
        .filter(|&seen| seen)
        .count();
    reached == grid.open_count()
}

/// Returns the size of the smallest open component, or `None` for a board
/// without open cells.
#[must_use]
pub fn smallest_open_component(grid: &Grid, adjacency: Adjacency) -> Option<usize> {
    open_components(grid, adjacency)
        .iter()
        .map(Vec::len)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_in_row_major_order() {
        let grid: Grid = ". # . / . # . / # # .".parse().unwrap();
        let comps = open_components(&grid, Adjacency::Four);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0][0], Position::new(0, 0));
        assert_eq!(comps[0].len(), 2);
        assert_eq!(comps[1].len(), 3);
        assert_eq!(smallest_open_component(&grid, Adjacency::Four), Some(2));
    }

    #[test]
    fn test_flood_fill_respects_passable() {
        let grid = Grid::new(3, 3).unwrap();
        let wall = Position::new(1, 1);
        let seen = flood_fill(&grid, Adjacency::Four, Position::new(0, 0), |p| {
            p != wall && p.row() < 2
        });
        assert_eq!(seen.iter().filter(|&&s| s).count(), 5);
        assert!(!seen[grid.index(wall)]);
    }

    #[test]
    fn test_is_connected_full_board() {
        let grid = Grid::new(4, 5).unwrap();
        assert!(is_connected(&grid, Adjacency::Four));
        let blocked = grid.with_blocked((0..4).map(|r| Position::new(r, 2)));
        assert!(!is_connected(&blocked, Adjacency::Four));
        assert!(!is_connected(&blocked, Adjacency::Eight));
        assert!(!is_connected(&grid.with_blocked(grid.positions().collect::<Vec<_>>()), Adjacency::Four));
    }
}
