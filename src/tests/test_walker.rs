use sprs::TriMat;

use crate::edgesim::{EdgeSimMatrix, EDGE_DEFAULT};
use crate::walker::{walk_align, WalkParams};

fn matrix_from_edges(n: usize, level: &str, edges: &[(usize, usize, f64)]) -> EdgeSimMatrix {
    let mut triplets: TriMat<f64> = TriMat::new((n, n));
    for &(i, j, w) in edges {
        triplets.add_triplet(i, j, w);
        triplets.add_triplet(j, i, w);
    }
    EdgeSimMatrix {
        matrix: triplets.to_csr(),
        nnodes: n,
        level: level.to_string(),
    }
}

fn identity_sims(entities: &[usize]) -> Vec<((usize, usize), f64)> {
    entities.iter().map(|&k| ((k, k), 1.0)).collect()
}

#[test]
fn identical_graphs_give_positive_scores_with_the_hub_on_top() {
    // Entity 0 is a strongly connected hub; the walk should concentrate
    // stationary mass on it.
    let edges = [
        (0, 1, 0.9),
        (0, 2, 0.9),
        (0, 3, 0.9),
        (1, 2, 0.2),
    ];
    let e1 = matrix_from_edges(4, "a", &edges);
    let e2 = matrix_from_edges(4, "b", &edges);
    let sims = identity_sims(&[0, 1, 2, 3]);

    let scores = walk_align(&e1, &e2, &sims, &WalkParams::default());
    for k in 0..4 {
        assert!(scores[k] > 0.0, "score for {} not positive: {}", k, scores[k]);
        assert!(scores[k] <= 1.0);
    }

    let top = (0..4)
        .max_by(|&a, &b| scores[a].total_cmp(&scores[b]))
        .unwrap();
    assert_eq!(top, 0, "hub should rank highest, scores: {:?}", &scores[..4]);
}

#[test]
fn walk_is_symmetric_in_level_order() {
    let edges = [(0, 1, 0.8), (1, 2, 0.5), (0, 2, 0.3)];
    let e1 = matrix_from_edges(3, "a", &edges);
    let e2 = matrix_from_edges(3, "b", &edges);
    let sims = identity_sims(&[0, 1, 2]);
    let params = WalkParams::default();

    let forward = walk_align(&e1, &e2, &sims, &params);
    let backward = walk_align(&e2, &e1, &sims, &params);
    for (a, b) in forward.iter().zip(backward.iter()) {
        assert!(a.total_cmp(b).is_eq(), "asymmetric walk: {} vs {}", a, b);
    }
}

#[test]
fn entities_absent_from_either_level_stay_nan() {
    let e1 = matrix_from_edges(4, "a", &[(0, 1, 0.5)]);
    let e2 = matrix_from_edges(4, "b", &[(2, 3, 0.5)]);
    let sims = identity_sims(&[0, 1, 2, 3]);

    let scores = walk_align(&e1, &e2, &sims, &WalkParams::default());
    assert!(scores.iter().all(|s| s.is_nan()));
}

#[test]
fn non_positive_edges_carry_no_walk_mass() {
    // Sentinels and anti-correlated edges leave every product vertex
    // dangling; the walk settles on the uniform distribution.
    let edges = [(0, 1, EDGE_DEFAULT), (0, 2, -0.4), (1, 2, -1.0)];
    let e1 = matrix_from_edges(3, "a", &edges);
    let e2 = matrix_from_edges(3, "b", &edges);
    let sims = identity_sims(&[0, 1, 2]);

    let scores = walk_align(&e1, &e2, &sims, &WalkParams::default());
    let uniform = 1.0 / 9.0;
    for k in 0..3 {
        assert!(
            (scores[k] - uniform).abs() < 1e-6,
            "expected uniform mass, got {}",
            scores[k]
        );
    }
}

#[test]
fn short_walks_are_bounded_by_the_step_count() {
    let edges = [(0, 1, 1.0), (1, 2, 1.0)];
    let e1 = matrix_from_edges(3, "a", &edges);
    let e2 = matrix_from_edges(3, "b", &edges);
    let sims = identity_sims(&[0, 1, 2]);

    let params = WalkParams {
        restart: 0.05,
        steps: 1,
        tolerance: 0.0,
    };
    let scores = walk_align(&e1, &e2, &sims, &params);
    // One step still yields a proper distribution over the product graph.
    assert!(scores.iter().filter(|s| !s.is_nan()).all(|&s| s > 0.0 && s < 1.0));
}
