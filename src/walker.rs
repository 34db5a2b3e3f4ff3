//! Random-walk alignment of two levels over their product graph.
//!
//! ## Algorithm Overview
//!
//! 1. **Product graph**: vertices are pairs `(i, j)` with `i` an entity of
//!    the first level and `j` of the second; the transition weight from
//!    `(i, j)` to `(i', j')` is `E1[i, i'] · E2[j, j']`, positive edge
//!    similarities only (sentinels and anti-correlated pairs carry no mass).
//! 2. **Restart**: each row is normalized so outgoing probabilities sum to
//!    `1 - r`; a uniform jump of `r / |vertices|` reaches every vertex.
//!    Vertices without positive outgoing mass redistribute uniformly.
//! 3. **Power iteration**: `π_{t+1} = (1-r) · Pᵀ · π_t + r · u`, starting
//!    from a distribution weighted by the vertex similarities, until the L1
//!    change drops below `tolerance` or `steps` iterations elapse.
//! 4. **Projection**: the score of entity `k` present in both levels is
//!    `π(k, k)`; other entities stay NaN.

use std::collections::HashMap;

use log::{debug, info};
use sprs::{CsMat, TriMat};

use crate::edgesim::EdgeSimMatrix;

#[derive(Debug, Clone, Copy)]
pub struct WalkParams {
    /// Restart (teleport) probability, in `(0, 1)`.
    pub restart: f64,
    /// Maximum number of iterations.
    pub steps: usize,
    /// L1 convergence threshold.
    pub tolerance: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            restart: 0.05,
            steps: 10_000,
            tolerance: 1e-8,
        }
    }
}

/// Positive-weight sparse rows of an edge matrix, keyed by entity.
fn positive_rows(e: &EdgeSimMatrix, entities: &[usize]) -> HashMap<usize, Vec<(usize, f64)>> {
    let mut out = HashMap::with_capacity(entities.len());
    for &i in entities {
        let row: Vec<(usize, f64)> = match e.matrix.outer_view(i) {
            Some(row) => row
                .iter()
                .filter(|&(j, &v)| j != i && v > 0.0)
                .map(|(j, &v)| (j, v))
                .collect(),
            None => Vec::new(),
        };
        out.insert(i, row);
    }
    out
}

/// Align two levels by a restartable random walk; returns dense length-N
/// scores, NaN where undefined.
pub fn walk_align(
    e1: &EdgeSimMatrix,
    e2: &EdgeSimMatrix,
    vertex_sims: &[((usize, usize), f64)],
    params: &WalkParams,
) -> Vec<f64> {
    let ents1 = e1.rows();
    let ents2 = e2.rows();
    let n1 = ents1.len();
    let n2 = ents2.len();
    let nv = n1 * n2;

    info!(
        "Random walk alignment '{}' ({} entities) vs '{}' ({} entities): {} product vertices",
        e1.level, n1, e2.level, n2, nv
    );

    let mut scores = vec![f64::NAN; e1.nnodes];
    if nv == 0 {
        return scores;
    }

    let pos1: HashMap<usize, usize> =
        ents1.iter().enumerate().map(|(p, &i)| (i, p)).collect();
    let pos2: HashMap<usize, usize> =
        ents2.iter().enumerate().map(|(p, &j)| (j, p)).collect();
    let product = |i: usize, j: usize| pos1[&i] * n2 + pos2[&j];

    let rows1 = positive_rows(e1, &ents1);
    let rows2 = positive_rows(e2, &ents2);

    // Row-normalized transition probabilities; restart mass is applied in
    // the iteration, not stored.
    let mut triplets: TriMat<f64> = TriMat::new((nv, nv));
    let mut dangling = vec![true; nv];
    for &i in &ents1 {
        for &j in &ents2 {
            let a = product(i, j);
            let out1 = &rows1[&i];
            let out2 = &rows2[&j];
            let sum1: f64 = out1.iter().map(|&(_, w)| w).sum();
            let sum2: f64 = out2.iter().map(|&(_, w)| w).sum();
            let total = sum1 * sum2;
            if total <= 0.0 {
                continue;
            }
            dangling[a] = false;
            for &(i2, w1) in out1 {
                for &(j2, w2) in out2 {
                    triplets.add_triplet(a, product(i2, j2), w1 * w2 / total);
                }
            }
        }
    }
    let transition: CsMat<f64> = triplets.to_csr();
    debug!(
        "Product transition matrix: {} non-zeros, {} dangling vertices",
        transition.nnz(),
        dangling.iter().filter(|&&d| d).count()
    );

    // Initial distribution weighted by the vertex similarities; uniform when
    // they place no mass on the product space.
    let mut pi = vec![0.0; nv];
    for &((i, j), sim) in vertex_sims {
        if let (Some(&p1), Some(&p2)) = (pos1.get(&i), pos2.get(&j)) {
            pi[p1 * n2 + p2] += sim.max(0.0);
        }
    }
    let mass: f64 = pi.iter().sum();
    if mass > 0.0 {
        for v in pi.iter_mut() {
            *v /= mass;
        }
    } else {
        debug!("Vertex similarities place no mass on the product space; starting uniform");
        pi.iter_mut().for_each(|v| *v = 1.0 / nv as f64);
    }

    let r = params.restart;
    let uniform = 1.0 / nv as f64;
    for step in 0..params.steps {
        let mut next = vec![0.0; nv];
        let mut dangling_mass = 0.0;
        for (a, row) in transition.outer_iterator().enumerate() {
            if dangling[a] {
                dangling_mass += pi[a];
                continue;
            }
            let weight = (1.0 - r) * pi[a];
            for (b, &p) in row.iter() {
                next[b] += weight * p;
            }
        }

        // Restart mass from followed walks plus the full mass of dangling
        // vertices, spread uniformly.
        let jump = (r * (1.0 - dangling_mass) + dangling_mass) * uniform;
        for v in next.iter_mut() {
            *v += jump;
        }

        let delta: f64 = next
            .iter()
            .zip(pi.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        pi = next;
        if delta < params.tolerance {
            debug!("Walk converged after {} steps (delta={:.3e})", step + 1, delta);
            break;
        }
    }

    for &i in &ents1 {
        if pos2.contains_key(&i) {
            scores[i] = pi[product(i, i)];
        }
    }
    scores
}
