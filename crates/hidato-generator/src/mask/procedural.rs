use hidato_core::{Adjacency, Grid, Position, connectivity};
use rand::{Rng, RngExt as _, seq::SliceRandom as _};

/// Chance of keeping a cell that touches an already blocked cell.
const CLUSTER_KEEP_PROBABILITY: f64 = 0.35;

/// Samples up to `count` open cells to block, biased towards spreading them out.
///
/// Cells are visited in random order. A cell touching an already chosen cell
/// (in any of the eight directions) is kept only with a reduced probability,
/// and no cell is kept if it would split the open cells. Under the
/// 4-neighbour rule the two colour classes are kept within one cell of each
/// other, which every Hamiltonian path on a bipartite board requires.
pub(crate) fn sample<R>(
    grid: &Grid,
    adjacency: Adjacency,
    count: usize,
    protected: &[Position],
    rng: &mut R,
) -> Vec<Position>
where
    R: Rng + ?Sized,
{
    let mut candidates = grid
        .open_positions()
        .filter(|pos| !protected.contains(pos))
        .collect::<Vec<_>>();
    candidates.shuffle(rng);

    let mut board = grid.clone();
    let mut chosen: Vec<Position> = Vec::with_capacity(count);
    let mut imbalance = colour_imbalance(grid);
    for pos in candidates {
        if chosen.len() >= count {
            break;
        }
        let shifted = imbalance - colour(pos);
        if adjacency == Adjacency::Four {
            let picks_left = i64::try_from(count - chosen.len() - 1).unwrap_or(i64::MAX);
            if shifted.abs() > picks_left.saturating_add(1) {
                continue;
            }
        }
        let clustered = grid
            .neighbors(pos, Adjacency::Eight)
            .into_iter()
            .any(|n| chosen.contains(&n));
        if clustered && !rng.random_bool(CLUSTER_KEEP_PROBABILITY) {
            continue;
        }
        let trial = board.with_blocked([pos]);
        if !connectivity::is_connected(&trial, adjacency) {
            continue;
        }
        board = trial;
        chosen.push(pos);
        imbalance = shifted;
    }
    chosen.sort_unstable();
    chosen
}

/// `+1` for a dark cell, `-1` for a light one, in the 4-neighbour colouring.
fn colour(pos: Position) -> i64 {
    if (pos.row() + pos.col()) % 2 == 0 { 1 } else { -1 }
}

/// Dark open cells minus light open cells.
fn colour_imbalance(grid: &Grid) -> i64 {
    grid.open_positions().map(colour).sum()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_sample_keeps_board_connected() {
        let grid = Grid::new(8, 8).unwrap();
        let protected = [Position::new(0, 0), Position::new(7, 7)];
        let mut rng = Pcg64::seed_from_u64(21);
        let cells = sample(&grid, Adjacency::Four, 9, &protected, &mut rng);
        assert_eq!(cells.len(), 9);
        assert!(cells.iter().all(|pos| !protected.contains(pos)));
        let masked = grid.with_blocked(cells.iter().copied());
        assert!(connectivity::is_connected(&masked, Adjacency::Four));
        assert!(colour_imbalance(&masked).abs() <= 1);
    }
}
