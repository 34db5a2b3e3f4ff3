//! Aligner configuration and the cross-level run loop.

use dashmap::DashMap;
use log::{debug, info};
use rayon::prelude::*;

use crate::aggregate::aggregate;
use crate::cosine::{cosine_align, CosineConfig};
use crate::edgesim::{build_edge_matrix, EdgeSimMatrix};
use crate::error::{Error, Result};
use crate::levels::LevelSet;
use crate::stats::{Confidence, NanPolicy};
use crate::vertexsim::VertexSimMap;
use crate::walker::{walk_align, WalkParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentMethod {
    #[default]
    CosineSimilarity,
    RandomWalker,
}

/// Builder for an [`Aligner`].
///
/// Defaults: cosine method, BCa bootstrap confidence, 10000 steps, restart
/// 0.05, NaN policy `Zero`, random global seed.
pub struct AlignerBuilder {
    method: AlignmentMethod,
    confidence: Confidence,
    nan_policy: NanPolicy,
    steps: usize,
    restart: f64,
    seed: Option<u64>,
}

impl Default for AlignerBuilder {
    fn default() -> Self {
        Self {
            method: AlignmentMethod::default(),
            confidence: Confidence::default(),
            nan_policy: NanPolicy::default(),
            steps: 10_000,
            restart: 0.05,
            seed: None,
        }
    }
}

impl AlignerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: AlignmentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    /// Trial count under the cosine method, walk length under the walker.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_restart(mut self, restart: f64) -> Self {
        self.restart = restart;
        self
    }

    /// Fix the global seed; per-job generators derive from it.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Aligner> {
        if self.steps < 1 {
            return Err(Error::InvalidConfig(format!(
                "steps must be at least 1, got {}",
                self.steps
            )));
        }
        if !(self.restart > 0.0 && self.restart < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "walker restart must lie in (0, 1), got {}",
                self.restart
            )));
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        info!(
            "Aligner: method={:?}, confidence={:?}, steps={}, restart={}, seed={}",
            self.method, self.confidence, self.steps, self.restart, seed
        );

        Ok(Aligner {
            method: self.method,
            confidence: self.confidence,
            nan_policy: self.nan_policy,
            steps: self.steps,
            restart: self.restart,
            seed,
        })
    }
}

/// Configured alignment run over a set of levels.
#[derive(Debug, Clone)]
pub struct Aligner {
    method: AlignmentMethod,
    confidence: Confidence,
    nan_policy: NanPolicy,
    steps: usize,
    restart: f64,
    seed: u64,
}

impl Aligner {
    /// Build all edge matrices, align every unordered level pair, and
    /// aggregate into one dense length-`n` score vector.
    pub fn align(&self, set: &LevelSet, vertex_map: &VertexSimMap, n: usize) -> Vec<f64> {
        info!("Aligning {} levels over {} entities", set.len(), n);

        let matrices: Vec<EdgeSimMatrix> = set
            .levels
            .par_iter()
            .map(|level| build_edge_matrix(level, n))
            .collect();

        let pairs = set.pairs();
        debug!("{} level pairs to align", pairs.len());

        // Keyed collection so aggregation order never depends on which pair
        // finishes first.
        let results: DashMap<(usize, usize), Vec<f64>> = DashMap::new();
        pairs
            .par_iter()
            .enumerate()
            .for_each(|(pair_index, &(a, b))| {
                let scores = self.align_pair(
                    &matrices[a],
                    &matrices[b],
                    vertex_map.pairs(a, b),
                    pair_index as u64,
                );
                results.insert((a, b), scores);
            });

        let collected: Vec<Vec<f64>> = pairs
            .iter()
            .map(|key| {
                results
                    .remove(key)
                    .map(|(_, v)| v)
                    .unwrap_or_else(|| vec![f64::NAN; n])
            })
            .collect();

        aggregate(&collected, n)
    }

    /// Align one pair of edge matrices with the configured method.
    pub fn align_pair(
        &self,
        e1: &EdgeSimMatrix,
        e2: &EdgeSimMatrix,
        vertex_sims: &[((usize, usize), f64)],
        pair_index: u64,
    ) -> Vec<f64> {
        match self.method {
            AlignmentMethod::CosineSimilarity => {
                let cfg = CosineConfig {
                    trials: self.steps,
                    confidence: self.confidence,
                    nan_policy: self.nan_policy,
                    seed: self.seed,
                    pair_index,
                };
                cosine_align(e1, e2, vertex_sims, &cfg).scores
            }
            AlignmentMethod::RandomWalker => {
                let params = WalkParams {
                    restart: self.restart,
                    steps: self.steps,
                    tolerance: 1e-8,
                };
                walk_align(e1, e2, vertex_sims, &params)
            }
        }
    }
}
