//! End-to-end checks of the generation pipeline.

use hidato_core::{Adjacency, Position, connectivity};
use hidato_generator::{
    Difficulty, GeneratedPuzzle, GenerationState, GeneratorConfig, MaskMode, PathMode, PuzzleGenerator,
    mask::MaskRejection, path::PathReason, repair::MAX_STRUCTURAL_ATTEMPTS,
};
use hidato_solver::{Deadline, SearchConfig, UniquenessDecision, search};
use proptest::prelude::*;

fn generate(config: GeneratorConfig) -> GeneratedPuzzle {
    PuzzleGenerator::new(config).unwrap().generate().unwrap()
}

fn assert_well_formed(puzzle: &GeneratedPuzzle) {
    let shape = puzzle.puzzle().unwrap();
    let solution = puzzle.solution();
    assert!(shape.is_solution(&solution));
    assert_eq!(puzzle.path.len(), puzzle.grid.open_count());
    assert!(connectivity::is_connected(&puzzle.grid, puzzle.adjacency));
    assert_eq!(puzzle.clues.first(), Some(&1));
    assert_eq!(puzzle.clues.last(), Some(&puzzle.max_value()));
    assert!(puzzle.metrics.repair_attempts <= MAX_STRUCTURAL_ATTEMPTS);
    assert_eq!(puzzle.metrics.states.last(), Some(&GenerationState::Accepted));

    let outcome = search(&shape, SearchConfig::capped(2), Deadline::never());
    assert!(outcome.is_definitive());
    assert_eq!(outcome.solutions.len(), 1);
}

#[test]
fn test_serpentine_without_mask_follows_rows() {
    let config = GeneratorConfig::default()
        .with_size(5, 5)
        .with_path_mode(PathMode::Serpentine)
        .with_mask(false)
        .with_seed(42);
    let puzzle = generate(config);

    let expected = (0..5)
        .flat_map(|row| {
            let cols: Box<dyn Iterator<Item = u8>> = if row % 2 == 0 {
                Box::new(0..5)
            } else {
                Box::new((0..5).rev())
            };
            cols.map(move |col| Position::new(row, col))
        })
        .collect::<Vec<_>>();
    assert_eq!(puzzle.path, expected);
    assert!(puzzle.clues.contains(&1));
    assert!(puzzle.clues.contains(&25));
    assert_eq!(puzzle.metrics.path_mode, PathMode::Serpentine);
    assert_eq!(puzzle.metrics.path_reason, Some(PathReason::Success));
    assert_well_formed(&puzzle);
}

#[test]
fn test_density_over_cap_leaves_board_unmasked() {
    let mut config = GeneratorConfig::default().with_size(6, 6).with_seed(3);
    config.mask_mode = MaskMode::Procedural;
    config.mask_density = Some(0.12);
    let puzzle = generate(config);

    assert_eq!(puzzle.metrics.mask_attempts, 8);
    assert_eq!(puzzle.metrics.mask_rejections.len(), 8);
    assert!(
        puzzle
            .metrics
            .mask_rejections
            .iter()
            .all(|r| matches!(r, MaskRejection::DensityExceeded { .. }))
    );
    assert_eq!(puzzle.metrics.mask_pattern, None);
    assert_eq!(puzzle.grid.open_count(), 36);
    assert_well_formed(&puzzle);
}

#[test]
fn test_partial_path_blocks_uncovered_cells() {
    let mut config = GeneratorConfig::default()
        .with_size(9, 9)
        .with_difficulty(Difficulty::Easy)
        .with_path_mode(PathMode::RandomWalkV2)
        .with_mask(false)
        .with_partial_paths(0.85)
        .with_seed(11);
    config.random_walk_max_nodes = Some(75);
    let puzzle = generate(config);

    let metrics = &puzzle.metrics;
    assert_eq!(metrics.path_mode, PathMode::RandomWalkV2);
    assert_eq!(metrics.path_reason, Some(PathReason::PartialAccepted));
    assert_eq!(metrics.path_builds, 1);
    assert!(metrics.path_coverage >= 0.85 && metrics.path_coverage < 1.0);
    assert!(puzzle.max_value() <= 75);
    assert_eq!(metrics.uncovered_blocked, 81 - puzzle.path.len());
    assert_eq!(puzzle.grid.blocked_positions().count(), metrics.uncovered_blocked);
    assert_well_formed(&puzzle);
}

#[test]
fn test_eight_neighbour_generations_respect_repair_cap() {
    for seed in 0..6 {
        let config = GeneratorConfig::default()
            .with_size(6, 6)
            .with_adjacency(Adjacency::Eight)
            .with_seed(seed);
        let puzzle = generate(config);
        let metrics = &puzzle.metrics;
        assert!(metrics.repair_attempts <= MAX_STRUCTURAL_ATTEMPTS, "seed {seed}");
        assert!(metrics.repairs_applied as usize <= metrics.repair_attempts);
        assert_eq!(metrics.uniqueness_decision, Some(UniquenessDecision::Unique));
        assert_well_formed(&puzzle);
    }
}

#[test]
fn test_same_seed_reproduces_puzzle() {
    let config = GeneratorConfig::default().with_size(6, 6).with_seed(2024);
    let first = generate(config.clone());
    let second = generate(config);

    assert_eq!(first.grid, second.grid);
    assert_eq!(first.clues, second.clues);
    assert_eq!(first.path, second.path);
    assert_eq!(first.seed, second.seed);
    assert_eq!(first.metrics.without_timings(), second.metrics.without_timings());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn test_generation_is_deterministic(seed in any::<u64>(), eight in any::<bool>()) {
        let adjacency = if eight { Adjacency::Eight } else { Adjacency::Four };
        let config = GeneratorConfig::default()
            .with_size(5, 6)
            .with_adjacency(adjacency)
            .with_seed(seed);
        let first = generate(config.clone());
        let second = generate(config);
        prop_assert_eq!(&first.grid, &second.grid);
        prop_assert_eq!(&first.path, &second.path);
        prop_assert_eq!(first.metrics.without_timings(), second.metrics.without_timings());
        assert_well_formed(&first);
    }
}
