use approx::assert_relative_eq;

use crate::builder::{AlignerBuilder, AlignmentMethod};
use crate::error::Error;
use crate::tests::{level_set, mirrored_levels, TRIALS};
use crate::vertexsim::VertexSimMap;

#[test]
fn defaults_build() {
    AlignerBuilder::new().build().unwrap();
}

#[test]
fn zero_steps_are_rejected() {
    match AlignerBuilder::new().with_steps(0).build() {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("steps")),
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
}

#[test]
fn restart_outside_unit_interval_is_rejected() {
    for restart in [0.0, 1.0, -0.3, 2.5] {
        assert!(
            matches!(
                AlignerBuilder::new().with_restart(restart).build(),
                Err(Error::InvalidConfig(_))
            ),
            "restart {} should be rejected",
            restart
        );
    }
}

#[test]
fn full_cosine_run_scores_mirrored_levels_at_one() {
    let (set, registry) = mirrored_levels();
    let map = VertexSimMap::identity(&set, &registry, None);
    let aligner = AlignerBuilder::new()
        .with_steps(TRIALS)
        .with_seed(7)
        .build()
        .unwrap();

    let scores = aligner.align(&set, &map, registry.len());
    for (idx, _) in registry.iter() {
        assert_relative_eq!(scores[idx], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn fixed_seed_runs_are_reproducible() {
    let (set, registry) = mirrored_levels();
    let map = VertexSimMap::identity(&set, &registry, None);

    let first = AlignerBuilder::new()
        .with_steps(TRIALS)
        .with_seed(1234)
        .build()
        .unwrap()
        .align(&set, &map, registry.len());
    let second = AlignerBuilder::new()
        .with_steps(TRIALS)
        .with_seed(1234)
        .build()
        .unwrap()
        .align(&set, &map, registry.len());

    for (a, b) in first.iter().zip(second.iter()) {
        assert!(a.total_cmp(b).is_eq(), "non-reproducible: {} vs {}", a, b);
    }
}

#[test]
fn walker_method_scores_shared_entities_positively() {
    let (set, registry) = mirrored_levels();
    let map = VertexSimMap::identity(&set, &registry, None);
    let aligner = AlignerBuilder::new()
        .with_method(AlignmentMethod::RandomWalker)
        .with_seed(7)
        .build()
        .unwrap();

    let scores = aligner.align(&set, &map, registry.len());
    for (idx, name) in registry.iter() {
        assert!(scores[idx] > 0.0, "walker score for {} not positive", name);
    }
}

#[test]
fn single_level_yields_all_nan() {
    let (set, registry) = level_set(&[
        ("a", "r1", "e1", 1.0),
        ("a", "r2", "e1", 2.0),
        ("a", "r1", "e2", 3.0),
        ("a", "r2", "e2", 4.0),
    ]);
    let map = VertexSimMap::identity(&set, &registry, None);
    let aligner = AlignerBuilder::new().with_steps(TRIALS).with_seed(7).build().unwrap();

    let scores = aligner.align(&set, &map, registry.len());
    assert!(scores.iter().all(|s| s.is_nan()));
}
