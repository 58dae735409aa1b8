//! Structural repair on a narrow eight-neighbour corridor.

use hidato_core::{Adjacency, Grid, Position};
use hidato_generator::repair::{RepairKind, RepairReason, StructuralRepair};
use hidato_solver::{
    Deadline, Puzzle, Solution, UniquenessDecision, UniquenessValidator, ValidatorConfig,
};
use rand::SeedableRng as _;
use rand_pcg::Pcg64;

/// A 2x5 corridor walked in column pairs.
fn corridor_path() -> Solution {
    Solution::new(
        [
            (0, 0),
            (1, 0),
            (1, 1),
            (0, 1),
            (0, 2),
            (1, 2),
            (1, 3),
            (0, 3),
            (0, 4),
            (1, 4),
        ]
        .into_iter()
        .map(|(row, col)| Position::new(row, col))
        .collect(),
    )
}

#[test]
fn test_blocking_divergent_cell_restores_uniqueness() {
    let shape = Grid::new(2, 5).unwrap();
    let path = corridor_path();
    let previous =
        Puzzle::from_solution(&shape, Adjacency::Eight, &path, [1, 2, 4, 6, 8, 10]).unwrap();
    let mut validator = UniquenessValidator::new(ValidatorConfig::default());
    let mut rng = Pcg64::seed_from_u64(17);

    assert_eq!(
        validator.validate(&previous, &mut rng).decision,
        UniquenessDecision::Unique
    );
    let candidate = previous.without_clue(2);
    let report = validator.validate(&candidate, &mut rng);
    assert_eq!(report.decision, UniquenessDecision::NonUnique);
    assert_eq!(report.witnesses.len(), 2);

    let mut repair = StructuralRepair::new(true, 2);
    let outcome = repair.repair(
        &previous,
        2,
        &path,
        &report.witnesses,
        &mut validator,
        &mut rng,
        Deadline::never(),
    );

    assert!(outcome.is_structural());
    assert_eq!(repair.attempts(), 1);
    assert_eq!(outcome.actions.len(), 1);
    let action = &outcome.actions[0];
    assert_eq!(action.kind, RepairKind::Block);
    assert_eq!(action.position, Position::new(1, 1));
    assert!(action.applied);
    assert_eq!(action.reason, RepairReason::Resolved);

    let repaired = &outcome.puzzle;
    assert!(!repaired.grid().is_open(Position::new(1, 1)));
    assert_eq!(repaired.max_value(), 9);
    // The removed clue stays removed and no clue is added back.
    assert_eq!(repaired.clue_count(), candidate.clue_count());
    assert!(repaired.clue_count() < previous.clue_count());
    assert_eq!(
        repaired.clues().collect::<Vec<_>>(),
        [1, 3, 5, 7, 9]
    );
    assert!(repaired.is_solution(&outcome.path));

    let mut fresh = UniquenessValidator::new(ValidatorConfig::default());
    assert_eq!(
        fresh.validate(repaired, &mut rng).decision,
        UniquenessDecision::Unique
    );

    let region = &outcome.regions[0];
    assert_eq!(region.cells, [Position::new(1, 0), Position::new(1, 1)]);
    assert_eq!(region.corridor_width, 5);
    assert_eq!(region.distance_from_clues, 1);
}
