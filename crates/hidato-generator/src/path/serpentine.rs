use hidato_core::{Grid, Position};

use super::{PathMetrics, PathReason};

/// Walks the board row by row, alternating direction.
///
/// Stops at the first blocked cell and reports the covered prefix.
pub(super) fn build(grid: &Grid) -> (Vec<Position>, PathReason, PathMetrics) {
    let mut positions = Vec::with_capacity(grid.open_count());
    for pos in order(grid) {
        if !grid.is_open(pos) {
            break;
        }
        positions.push(pos);
    }
    let reason = if positions.len() == grid.open_count() {
        PathReason::Success
    } else {
        PathReason::ExhaustedRestarts
    };
    let metrics = PathMetrics {
        steps: positions.len() as u64,
        restarts: 0,
    };
    (positions, reason, metrics)
}

/// Returns every cell of `grid` in boustrophedon order.
pub(super) fn order(grid: &Grid) -> impl Iterator<Item = Position> + '_ {
    (0..grid.rows()).flat_map(move |row| {
        let cols = grid.cols();
        (0..cols).map(move |i| {
            let col = if row % 2 == 0 { i } else { cols - 1 - i };
            grid.position(row * cols + col)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serpentine_order() {
        let grid = Grid::new(2, 3).unwrap();
        let (positions, reason, _) = build(&grid);
        assert_eq!(reason, PathReason::Success);
        assert_eq!(
            positions,
            [
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 2),
                Position::new(1, 1),
                Position::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_stops_at_blocked_cell() {
        let grid: Grid = ". . . / . # . / . . .".parse().unwrap();
        let (positions, reason, _) = build(&grid);
        assert_eq!(reason, PathReason::ExhaustedRestarts);
        assert_eq!(positions.len(), 4);
    }
}
