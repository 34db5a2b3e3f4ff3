//! Cosine alignment of two levels.
//!
//! For one unordered level pair, the cross-level vertex similarities are
//! folded into copies of both edge matrices; every entity with a stored row
//! in both folded matrices is then scored by the cosine of its two
//! neighborhood vectors (rows without the self entry), absent coordinates
//! taken as zero. Each scored vertex also carries a confidence statistic.
//!
//! Per-vertex jobs are pure functions of their edge rows and seed and run in
//! parallel; the output is identical regardless of scheduling.

use std::collections::HashSet;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::edgesim::{inject_vertex_sim, EdgeSimMatrix};
use crate::stats::{
    bca_bootstrap, job_seed, permutation_pvalue, sparse_cosine, Confidence, NanPolicy,
    Statistic,
};

#[derive(Debug, Clone)]
pub struct CosineConfig {
    /// Bootstrap or permutation trial count.
    pub trials: usize,
    pub confidence: Confidence,
    pub nan_policy: NanPolicy,
    /// Global seed; combined with `pair_index` and the entity index per job.
    pub seed: u64,
    pub pair_index: u64,
}

/// Scores and statistics for one level pair, dense over the entity index
/// space. Entities not shared by the pair stay NaN / `None`.
#[derive(Debug, Clone)]
pub struct PairAlignment {
    pub scores: Vec<f64>,
    pub stats: Vec<Option<Statistic>>,
}

fn densify(sparse: &[(usize, f64)], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for &(idx, v) in sparse {
        out[idx] = v;
    }
    out
}

/// Align two levels by neighborhood cosine similarity.
pub fn cosine_align(
    e1: &EdgeSimMatrix,
    e2: &EdgeSimMatrix,
    vertex_sims: &[((usize, usize), f64)],
    cfg: &CosineConfig,
) -> PairAlignment {
    info!(
        "Cosine alignment '{}' vs '{}' with {} vertex similarities",
        e1.level,
        e2.level,
        vertex_sims.len()
    );

    let folded1 = inject_vertex_sim(e1, vertex_sims);
    let folded2 = inject_vertex_sim(e2, vertex_sims);

    let rows2: HashSet<usize> = folded2.rows().into_iter().collect();
    let mut shared: Vec<usize> = folded1
        .rows()
        .into_iter()
        .filter(|k| rows2.contains(k))
        .collect();
    shared.sort_unstable();

    debug!(
        "{} shared vertices between '{}' and '{}'",
        shared.len(),
        e1.level,
        e2.level
    );

    let n = e1.nnodes;
    let results: Vec<(usize, f64, Statistic)> = shared
        .par_iter()
        .map(|&k| {
            let x = folded1.neighborhood(k);
            let y = folded2.neighborhood(k);

            let raw = sparse_cosine(&x, &y);
            let score = if raw.is_nan() {
                warn!(
                    "Zero-norm neighborhood for entity {} in pair ('{}', '{}'); score reset to 0",
                    k, e1.level, e2.level
                );
                0.0
            } else {
                raw
            };

            let seed = job_seed(cfg.seed, cfg.pair_index, k as u64);
            let stat = match cfg.confidence {
                Confidence::Bootstrap => {
                    let dense_x = densify(&x, n);
                    let dense_y = densify(&y, n);
                    bca_bootstrap(&dense_x, &dense_y, cfg.trials, seed, cfg.nan_policy)
                }
                Confidence::Permutation => {
                    permutation_pvalue(&x, &y, cfg.trials, seed, cfg.nan_policy)
                }
            };

            (k, score, stat)
        })
        .collect();

    let mut scores = vec![f64::NAN; n];
    let mut stats = vec![None; n];
    for (k, score, stat) in results {
        scores[k] = score;
        stats[k] = Some(stat);
    }

    PairAlignment { scores, stats }
}
