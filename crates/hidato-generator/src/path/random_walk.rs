//! Warnsdorff-ordered random walk.
//!
//! Each step moves to the unvisited neighbour with the fewest unvisited
//! onward neighbours, ties broken at random. A move is skipped if it would
//! split the unvisited cells or leave more than one dead end behind, since no
//! Hamiltonian completion could follow.

use hidato_core::{Adjacency, Grid, Position};
use hidato_solver::Deadline;
use log::trace;
use rand::{Rng, RngExt as _, seq::SliceRandom as _};

use super::{PathMetrics, PathReason};

pub(super) fn build<R>(
    grid: &Grid,
    adjacency: Adjacency,
    max_nodes: Option<usize>,
    max_restarts: u32,
    deadline: Deadline,
    rng: &mut R,
) -> (Vec<Position>, PathReason, PathMetrics)
where
    R: Rng + ?Sized,
{
    let mut walker = Walker::new(grid, adjacency);
    let open_count = walker.open.len();
    let mut metrics = PathMetrics::default();
    if open_count == 0 {
        return (Vec::new(), PathReason::ExhaustedRestarts, metrics);
    }
    let limit = max_nodes.unwrap_or(open_count).clamp(1, open_count);
    let mut best: Vec<usize> = Vec::new();

    let reason = loop {
        if deadline.is_expired() {
            break PathReason::Timeout;
        }
        // The first walk starts at the first open cell in row-major order.
        let start = if metrics.restarts == 0 {
            walker.open[0]
        } else {
            walker.open[rng.random_range(0..open_count)]
        };
        let walk = walker.walk(start, limit, deadline, rng, &mut metrics.steps);
        trace!(
            "random walk #{}: placed {} of {open_count}",
            metrics.restarts,
            walk.len()
        );
        if walk.len() > best.len() {
            best = walk;
        }
        if best.len() == open_count {
            break PathReason::Success;
        }
        if deadline.is_expired() {
            break PathReason::Timeout;
        }
        if best.len() >= limit || metrics.restarts >= max_restarts {
            break PathReason::ExhaustedRestarts;
        }
        metrics.restarts += 1;
    };

    let positions = best.into_iter().map(|i| grid.position(i)).collect();
    (positions, reason, metrics)
}

struct Walker {
    open: Vec<usize>,
    neighbors: Vec<Vec<usize>>,
    visited: Vec<bool>,
    seen: Vec<bool>,
    stack: Vec<usize>,
}

impl Walker {
    fn new(grid: &Grid, adjacency: Adjacency) -> Self {
        let neighbors = grid
            .positions()
            .map(|pos| {
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
        Self {
            open: grid.open_positions().map(|pos| grid.index(pos)).collect(),
            neighbors,
            visited: vec![false; grid.cell_count()],
            seen: vec![false; grid.cell_count()],
            stack: Vec::new(),
        }
    }

    fn walk<R>(
        &mut self,
        start: usize,
        limit: usize,
        deadline: Deadline,
        rng: &mut R,
        steps: &mut u64,
    ) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        self.visited.fill(false);
        self.visited[start] = true;
        let mut path = vec![start];
        let mut remaining = self.open.len() - 1;

        while path.len() < limit && remaining > 0 {
            if deadline.is_expired() {
                break;
            }
            *steps += 1;
            let head = path[path.len() - 1];
            let mut candidates = self.neighbors[head]
                .iter()
                .copied()
                .filter(|&c| !self.visited[c])
                .collect::<Vec<_>>();
            candidates.shuffle(rng);
            candidates.sort_by_key(|&c| self.onward(c));

            let Some(next) = candidates
                .into_iter()
                .find(|&c| self.keeps_completable(c, remaining - 1))
            else {
                break;
            };
            self.visited[next] = true;
            path.push(next);
            remaining -= 1;
        }
        path
    }

    fn onward(&self, cell: usize) -> usize {
        self.neighbors[cell]
            .iter()
            .filter(|&&n| !self.visited[n])
            .count()
    }

    /// Returns `true` if moving to `head` leaves the other `remaining` unvisited
    /// cells connected to it with at most one dead end.
    fn keeps_completable(&mut self, head: usize, remaining: usize) -> bool {
        if remaining == 0 {
            return true;
        }
        self.visited[head] = true;
        self.seen.fill(false);
        self.stack.clear();
        self.stack.push(head);
        self.seen[head] = true;
        let mut reached = 0;
        let mut dead_ends = 0;
        while let Some(cell) = self.stack.pop() {
            for &next in &self.neighbors[cell] {
                if self.visited[next] || self.seen[next] {
                    continue;
                }
                self.seen[next] = true;
                reached += 1;
                let touches_head = self.neighbors[next].contains(&head);
                if !touches_head && self.onward(next) <= 1 {
                    dead_ends += 1;
                }
                self.stack.push(next);
            }
        }
        self.visited[head] = false;
        reached == remaining && dead_ends <= 1
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_first_walk_starts_at_anchor() {
        let grid = Grid::new(4, 4).unwrap();
        let mut rng = Pcg64::seed_from_u64(9);
        let (positions, reason, _) =
            build(&grid, Adjacency::Four, None, 16, Deadline::never(), &mut rng);
        assert_eq!(reason, PathReason::Success);
        assert_eq!(positions.len(), 16);
        assert!(positions.contains(&Position::new(0, 0)));
    }

    #[test]
    fn test_node_limit_caps_walk_length() {
        let grid = Grid::new(5, 5).unwrap();
        let mut rng = Pcg64::seed_from_u64(9);
        let (positions, reason, metrics) =
            build(&grid, Adjacency::Four, Some(10), 16, Deadline::never(), &mut rng);
        assert_eq!(reason, PathReason::ExhaustedRestarts);
        assert_eq!(positions.len(), 10);
        assert_eq!(metrics.restarts, 0);
    }

    #[test]
    fn test_same_seed_same_walk() {
        let grid = Grid::new(6, 6).unwrap();
        let a = build(
            &grid,
            Adjacency::Eight,
            None,
            8,
            Deadline::never(),
            &mut Pcg64::seed_from_u64(4),
        );
        let b = build(
            &grid,
            Adjacency::Eight,
            None,
            8,
            Deadline::never(),
            &mut Pcg64::seed_from_u64(4),
        );
        assert_eq!(a, b);
    }
}
