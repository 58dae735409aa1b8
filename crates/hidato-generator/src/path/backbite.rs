//! Backbite mutations over a seed path.
//!
//! A backbite picks a path endpoint and one of its neighbours `p[i]`; since
//! the endpoint is adjacent to `p[i]`, reversing the segment between them
//! yields another Hamiltonian path with a different endpoint. Repeating the
//! move randomizes the path while keeping it Hamiltonian.

use hidato_core::{Adjacency, Grid, Position};
use hidato_solver::Deadline;
use log::trace;
use rand::{Rng, RngExt as _};

use super::{PathMetrics, PathParams, PathReason, random_walk, serpentine};

pub(super) fn build<R>(
    grid: &Grid,
    adjacency: Adjacency,
    params: &PathParams,
    deadline: Deadline,
    rng: &mut R,
) -> (Vec<Position>, PathReason, PathMetrics)
where
    R: Rng + ?Sized,
{
    let (mut path, reason, mut metrics) = if grid.open_count() == grid.cell_count() {
        serpentine::build(grid)
    } else {
        random_walk::build(grid, adjacency, None, params.max_restarts, deadline, rng)
    };
    if !reason.is_success() {
        return (path, reason, metrics);
    }

    let size = grid.rows().max(grid.cols()) as u64;
    let budget_ms = u64::try_from(params.time_budget.as_millis()).unwrap_or(u64::MAX);
    let iterations = size.pow(3).min(budget_ms / 2);
    let patience = 2 * size;

    let mut mutator = Backbite::new(grid, adjacency, &path);
    let mut unchanged = 0;
    for _ in 0..iterations {
        if deadline.is_expired() {
            break;
        }
        metrics.steps += 1;
        if mutator.step(rng) {
            unchanged = 0;
        } else {
            unchanged += 1;
            if unchanged >= patience {
                trace!("backbite: no change in {patience} attempts");
                break;
            }
        }
    }
    path = mutator.into_path(grid);
    // Every mutation keeps the path complete, so a cut-short run still succeeds.
    (path, PathReason::Success, metrics)
}

struct Backbite {
    adjacency: Adjacency,
    positions: Vec<Position>,
    neighbors: Vec<Vec<usize>>,
    /// Cell indices in path order.
    path: Vec<usize>,
    /// Path index of each cell.
    index: Vec<usize>,
}

impl Backbite {
    fn new(grid: &Grid, adjacency: Adjacency, path: &[Position]) -> Self {
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
            .collect();
        let path = path.iter().map(|&pos| grid.index(pos)).collect::<Vec<_>>();
        let mut index = vec![usize::MAX; grid.cell_count()];
        for (i, &cell) in path.iter().enumerate() {
            index[cell] = i;
        }
        Self {
            adjacency,
            positions,
            neighbors,
            path,
            index,
        }
    }

    /// Attempts one mutation and returns `true` if the path changed.
    fn step<R>(&mut self, rng: &mut R) -> bool
    where
        R: Rng + ?Sized,
    {
        let len = self.path.len();
        if len < 3 {
            return false;
        }
        let from_tail = rng.random_bool(0.5);
        let end = if from_tail { self.path[len - 1] } else { self.path[0] };
        let choices = &self.neighbors[end];
        if choices.is_empty() {
            return false;
        }
        let pivot = choices[rng.random_range(0..choices.len())];
        let i = self.index[pivot];
        if !self
            .adjacency
            .are_adjacent(self.positions[end], self.positions[pivot])
        {
            return false;
        }
        let (lo, hi) = if from_tail {
            if i + 1 == len - 1 {
                return false;
            }
            (i + 1, len - 1)
        } else {
            if i == 1 {
                return false;
            }
            (0, i - 1)
        };
        self.path[lo..=hi].reverse();
        for k in lo..=hi {
            self.index[self.path[k]] = k;
        }
        true
    }

    fn into_path(self, grid: &Grid) -> Vec<Position> {
        self.path.into_iter().map(|i| grid.position(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_mutations_keep_path_hamiltonian() {
        let grid = Grid::new(5, 6).unwrap();
        let (seed, _, _) = serpentine::build(&grid);
        let mut mutator = Backbite::new(&grid, Adjacency::Four, &seed);
        let mut rng = Pcg64::seed_from_u64(17);
        let mut changed = 0;
        for _ in 0..500 {
            if mutator.step(&mut rng) {
                changed += 1;
            }
            for pair in mutator.path.windows(2) {
                assert!(
                    Adjacency::Four.are_adjacent(mutator.positions[pair[0]], mutator.positions[pair[1]])
                );
            }
        }
        assert!(changed > 0);
        let mut cells = mutator.path.clone();
        cells.sort_unstable();
        assert_eq!(cells, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_mutation_moves_away_from_serpentine() {
        let grid = Grid::new(6, 6).unwrap();
        let params = PathParams {
            time_budget: Duration::from_secs(5),
            ..PathParams::default()
        };
        let mut rng = Pcg64::seed_from_u64(2);
        let (path, reason, metrics) =
            build(&grid, Adjacency::Four, &params, Deadline::never(), &mut rng);
        assert_eq!(reason, PathReason::Success);
        assert!(metrics.steps > 0);
        assert_ne!(path, serpentine::build(&grid).0);
    }
}
