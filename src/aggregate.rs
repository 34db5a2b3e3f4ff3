//! Aggregation of per-pair scores, ranking, accuracy, and output formatting.

use std::collections::HashSet;
use std::io::{self, Write};

use log::{debug, info};

use crate::registry::IdRegistry;

/// Per-entity mean of the defined scores across all level pairs.
///
/// Entities undefined in every pair stay NaN. The mean is insensitive to the
/// ordering of `pair_scores`.
pub fn aggregate(pair_scores: &[Vec<f64>], n: usize) -> Vec<f64> {
    let mut sums = vec![0.0; n];
    let mut counts = vec![0usize; n];
    for scores in pair_scores {
        for (k, &s) in scores.iter().enumerate() {
            if !s.is_nan() {
                sums[k] += s;
                counts[k] += 1;
            }
        }
    }

    let flat: Vec<f64> = sums
        .into_iter()
        .zip(counts.iter())
        .map(|(sum, &count)| {
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect();

    debug!(
        "Aggregated {} pairs: {} of {} entities defined",
        pair_scores.len(),
        counts.iter().filter(|&&c| c > 0).count(),
        n
    );
    flat
}

/// Entities ranked ascending by score, `(rank, entity)` with 1-based ranks.
/// NaN scores rank after every defined score; ties break by entity index.
pub fn rank_ascending(scores: &[f64]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order
        .into_iter()
        .enumerate()
        .map(|(pos, entity)| (pos + 1, entity))
        .collect()
}

/// Concentration of the truth set in the lowest-scoring ranks.
///
/// `1 - (Σ_{t ∈ truth} max(0, rank(t) - |truth|)) / F` with
/// `F = Σ_{k=0}^{|truth|-1} (N - k)`. Returns 1 for an empty truth set.
pub fn accuracy(truth: &HashSet<usize>, scores: &[f64]) -> f64 {
    let n = scores.len();
    let t = truth.len();
    if t == 0 || n == 0 {
        return 1.0;
    }

    let penalty: usize = rank_ascending(scores)
        .iter()
        .filter(|(_, entity)| truth.contains(entity))
        .map(|(rank, _)| rank.saturating_sub(t))
        .sum();
    let normalizer: usize = (0..t).map(|k| n - k).sum();

    let acc = 1.0 - penalty as f64 / normalizer as f64;
    info!(
        "Accuracy: {:.4} (penalty {}, normalizer {}, |truth| {})",
        acc, penalty, normalizer, t
    );
    acc
}

/// Write the score table: one `<name>\t<score>` line per entity in index
/// order. Undefined scores print as the literal `NaN`.
pub fn write_scores<W: Write>(
    out: &mut W,
    registry: &IdRegistry,
    scores: &[f64],
) -> io::Result<()> {
    for (idx, name) in registry.iter() {
        writeln!(out, "{}\t{}", name, scores[idx])?;
    }
    Ok(())
}
