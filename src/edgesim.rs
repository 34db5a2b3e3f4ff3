//! # Builds a per-level sparse symmetric edge-similarity matrix
//!
//! ## Algorithm Overview
//!
//! 1. **Pair enumeration**: every unordered pair of entities present in the
//!    level is a candidate edge.
//! 2. **Similarity computation**: Pearson correlation between the two
//!    entities' replicate vectors, restricted to positions where both values
//!    are present; at least two common positions are required.
//! 3. **Clamping**: similarities are bounded above at `MAXIMUM_EDGE`.
//! 4. **Sentinel assignment**: pairs that cannot be scored (too few common
//!    positions, or zero variance) take `EDGE_DEFAULT`, stored explicitly so
//!    that "unknown" is distinguishable from an implicit zero.
//! 5. **Symmetrization**: both `(i, j)` and `(j, i)` are stored.
//!
//! The matrix is `N × N` over the global entity index space; only entities
//! present in the level contribute rows. The diagonal is left unset by the
//! builder and is reserved for cross-level vertex-similarity injection
//! (`inject_vertex_sim`), which the cosine aligner applies on copies.
//!
//! Row construction is parallelized across entities with rayon; assembly goes
//! through a triplet buffer into CSR.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, trace};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use crate::levels::StandardLevel;

/// Sentinel for pairs with undefined similarity, outside `[-1, 1]`.
pub const EDGE_DEFAULT: f64 = -5.0;

/// Upper bound applied to every scored similarity.
pub const MAXIMUM_EDGE: f64 = 1.0;

/// Sparse symmetric `N × N` edge-similarity matrix for one level.
#[derive(Debug, Clone)]
pub struct EdgeSimMatrix {
    pub matrix: CsMat<f64>,
    pub nnodes: usize,
    pub level: String,
}

impl EdgeSimMatrix {
    /// Stored value at `(i, j)`, if any.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.matrix.get(i, j).copied()
    }

    /// Entity indices with at least one stored entry in their row.
    pub fn rows(&self) -> Vec<usize> {
        self.matrix
            .outer_iterator()
            .enumerate()
            .filter(|(_, row)| row.nnz() > 0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_row(&self, i: usize) -> bool {
        self.matrix
            .outer_view(i)
            .map(|row| row.nnz() > 0)
            .unwrap_or(false)
    }

    /// Sparse neighborhood vector of `k`: its row without the self entry.
    pub fn neighborhood(&self, k: usize) -> Vec<(usize, f64)> {
        match self.matrix.outer_view(k) {
            Some(row) => row
                .iter()
                .filter(|(j, _)| *j != k)
                .map(|(j, &v)| (j, v))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Check stored-entry symmetry within tolerance.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        for (val, (i, j)) in self.matrix.iter() {
            let back = self.get(j, i).unwrap_or(f64::NAN);
            if !((val - back).abs() <= tolerance) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for EdgeSimMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "EdgeSimMatrix '{}' ({}×{}): {} stored entries",
            self.level,
            self.nnodes,
            self.nnodes,
            self.nnz()
        )
    }
}

/// Pearson correlation over positions where both values are present.
///
/// Returns `None` with fewer than two common positions or when either side
/// has zero variance.
pub fn pearson_present(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let common: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if common.len() < 2 {
        return None;
    }

    let n = common.len() as f64;
    let mean_x: f64 = common.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y: f64 = common.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &common {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-12 {
        None
    } else {
        Some(cov / denom)
    }
}

/// Build the edge-similarity matrix for one level.
pub fn build_edge_matrix(level: &StandardLevel, nnodes: usize) -> EdgeSimMatrix {
    let entities = level.entities();
    info!(
        "Building edge matrix for level '{}': {} entities, {} replicates",
        level.name,
        entities.len(),
        level.n_replicates()
    );

    // Upper-triangle similarities in parallel, one job per row entity.
    let upper: Vec<Vec<(usize, usize, f64)>> = entities
        .par_iter()
        .enumerate()
        .map(|(pos, &i)| {
            let vec_i = level.replicate_vector(i).expect("entity listed for level");
            entities[pos + 1..]
                .iter()
                .map(|&j| {
                    let vec_j =
                        level.replicate_vector(j).expect("entity listed for level");
                    let sim = match pearson_present(vec_i, vec_j) {
                        Some(s) => s.min(MAXIMUM_EDGE),
                        None => EDGE_DEFAULT,
                    };
                    (i, j, sim)
                })
                .collect()
        })
        .collect();

    let mut triplets: TriMat<f64> = TriMat::new((nnodes, nnodes));
    let mut unscored = 0usize;
    for (i, j, sim) in upper.into_iter().flatten() {
        if sim == EDGE_DEFAULT {
            unscored += 1;
        }
        triplets.add_triplet(i, j, sim);
        triplets.add_triplet(j, i, sim);
    }

    let matrix: CsMat<f64> = triplets.to_csr();
    debug!(
        "Edge matrix '{}': {} stored entries, {} unscored pairs",
        level.name,
        matrix.nnz(),
        unscored
    );

    EdgeSimMatrix {
        matrix,
        nnodes,
        level: level.name.clone(),
    }
}

/// Fold cross-level vertex similarities into a copy of `e`.
///
/// Writes `E[i, j] = E[j, i] = v` for every `((i, j), v)`, overriding prior
/// entries. Idempotent: applying the same list twice is a no-op the second
/// time.
pub fn inject_vertex_sim(
    e: &EdgeSimMatrix,
    vertex_sims: &[((usize, usize), f64)],
) -> EdgeSimMatrix {
    trace!(
        "Injecting {} vertex similarities into edge matrix '{}'",
        vertex_sims.len(),
        e.level
    );

    let mut overrides: HashMap<(usize, usize), f64> =
        HashMap::with_capacity(vertex_sims.len() * 2);
    for &((i, j), v) in vertex_sims {
        overrides.insert((i, j), v);
        overrides.insert((j, i), v);
    }

    let mut triplets: TriMat<f64> = TriMat::new((e.nnodes, e.nnodes));
    for (val, (i, j)) in e.matrix.iter() {
        if !overrides.contains_key(&(i, j)) {
            triplets.add_triplet(i, j, *val);
        }
    }
    for (&(i, j), &v) in &overrides {
        triplets.add_triplet(i, j, v);
    }

    EdgeSimMatrix {
        matrix: triplets.to_csr(),
        nnodes: e.nnodes,
        level: e.level.clone(),
    }
}
