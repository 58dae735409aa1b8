use hidato_core::{Adjacency, Grid, Position, connectivity};

use super::MaskRejection;

/// Tolerance for comparing a realized density against its cap.
const DENSITY_EPSILON: f64 = 1e-9;

/// Checks a candidate set of blocked cells against the mask invariants.
///
/// In order: the density cap, protected anchors, a single open component (a
/// split off pocket smaller than `min_pocket` is reported as an orphan), and
/// the degree and colour counts every Hamiltonian path needs.
pub(crate) fn validate_mask(
    grid: &Grid,
    adjacency: Adjacency,
    cells: &[Position],
    anchors: &[Position],
    cap: f64,
    min_pocket: usize,
) -> Result<(), MaskRejection> {
    let density = super::density(grid, cells.len());
    if density > cap + DENSITY_EPSILON {
        return Err(MaskRejection::DensityExceeded { density, cap });
    }
    if let Some(&position) = cells.iter().find(|pos| anchors.contains(pos)) {
        return Err(MaskRejection::AnchorBlocked { position });
    }

    let masked = grid.with_blocked(cells.iter().copied());
    let components = connectivity::open_components(&masked, adjacency).len();
    if components > 1 {
        let smallest = connectivity::smallest_open_component(&masked, adjacency).unwrap_or(0);
        return Err(if smallest < min_pocket {
            MaskRejection::OrphanPocket { size: smallest }
        } else {
            MaskRejection::Disconnected { components }
        });
    }

    if !admits_hamiltonian_path(&masked, adjacency) {
        return Err(MaskRejection::NoHamiltonianPath);
    }
    Ok(())
}

/// Necessary conditions for a Hamiltonian path over the open cells.
///
/// At most two open cells may have a single open neighbour, and on the
/// 4-neighbour board the two colour classes may differ by at most one.
fn admits_hamiltonian_path(grid: &Grid, adjacency: Adjacency) -> bool {
    let open = grid.open_positions().collect::<Vec<_>>();
    if open.len() <= 1 {
        return true;
    }
    let dead_ends = open
        .iter()
        .filter(|&&pos| grid.open_neighbors(pos, adjacency).len() <= 1)
        .count();
    if dead_ends > 2 {
        return false;
    }
    if adjacency == Adjacency::Four {
        let dark = open
            .iter()
            .filter(|pos| (pos.row() + pos.col()) % 2 == 0)
            .count();
        let light = open.len() - dark;
        if dark.abs_diff(light) > 1 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(grid: &Grid) -> Vec<Position> {
        super::super::anchors(grid)
    }

    #[test]
    fn test_accepts_scattered_cells() {
        let grid = Grid::new(6, 6).unwrap();
        let cells = [Position::new(1, 1), Position::new(4, 3)];
        assert_eq!(
            validate_mask(&grid, Adjacency::Eight, &cells, &anchors(&grid), 0.10, 3),
            Ok(())
        );
    }

    #[test]
    fn test_rejects_density_over_cap() {
        let grid = Grid::new(6, 6).unwrap();
        let cells = [1, 2, 3, 4].map(|c| Position::new(2, c));
        let err = validate_mask(&grid, Adjacency::Eight, &cells, &anchors(&grid), 0.10, 3);
        assert!(matches!(err, Err(MaskRejection::DensityExceeded { .. })));
    }

    #[test]
    fn test_rejects_anchor() {
        let grid = Grid::new(6, 6).unwrap();
        let cells = [Position::new(5, 5)];
        assert_eq!(
            validate_mask(&grid, Adjacency::Eight, &cells, &anchors(&grid), 0.10, 3),
            Err(MaskRejection::AnchorBlocked {
                position: Position::new(5, 5)
            })
        );
    }

    #[test]
    fn test_rejects_orphan_pocket() {
        let grid = Grid::new(6, 6).unwrap();
        // Walls off the cell at (0, 5) under the 4-neighbour rule.
        let cells = [Position::new(0, 4), Position::new(1, 5)];
        assert_eq!(
            validate_mask(&grid, Adjacency::Four, &cells, &anchors(&grid), 0.10, 3),
            Err(MaskRejection::OrphanPocket { size: 1 })
        );
    }

    #[test]
    fn test_split_board_reports_smallest_side() {
        let grid = Grid::new(6, 6).unwrap();
        let wall = (0..6).map(|r| Position::new(r, 3)).collect::<Vec<_>>();
        assert_eq!(
            validate_mask(&grid, Adjacency::Four, &wall, &anchors(&grid), 0.2, 3),
            Err(MaskRejection::Disconnected { components: 2 })
        );
        assert_eq!(
            validate_mask(&grid, Adjacency::Four, &wall, &anchors(&grid), 0.2, 13),
            Err(MaskRejection::OrphanPocket { size: 12 })
        );
    }

    #[test]
    fn test_rejects_colour_imbalance() {
        let grid = Grid::new(6, 6).unwrap();
        // Both cells are dark, leaving 16 dark and 18 light cells.
        let cells = [Position::new(1, 1), Position::new(3, 3)];
        assert_eq!(
            validate_mask(&grid, Adjacency::Four, &cells, &anchors(&grid), 0.10, 3),
            Err(MaskRejection::NoHamiltonianPath)
        );
    }
}
