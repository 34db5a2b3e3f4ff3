//! Cosine similarity and confidence statistics.
//!
//! Two confidence paths are available per aligned vertex: a BCa
//! (bias-corrected accelerated) bootstrap interval over resampled vector
//! positions, and a permutation p-value over shuffled neighborhood values.
//! Each job derives its own `ChaCha8Rng` from a seed mixed out of the global
//! seed, the level-pair index, and the entity index, so results are
//! reproducible and independent of worker scheduling.

use log::trace;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};

/// Confidence level for bootstrap intervals.
pub const BOOTSTRAP_CONFIDENCE: f64 = 0.95;

/// Per-vertex confidence statistic.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistic {
    PValue(f64),
    Bootstrap {
        point: f64,
        lower: f64,
        upper: f64,
        level: f64,
    },
}

/// Which confidence statistic to compute alongside each cosine score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    #[default]
    Bootstrap,
    Permutation,
}

/// Treatment of NaN cosines (zero-norm resamples) inside the confidence
/// machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    #[default]
    Zero,
    Propagate,
}

impl NanPolicy {
    pub fn resolve(&self, c: f64) -> f64 {
        if c.is_nan() {
            match self {
                NanPolicy::Zero => 0.0,
                NanPolicy::Propagate => f64::NAN,
            }
        } else {
            c
        }
    }
}

/// Deterministic per-job seed from (global seed, pair index, entity index).
///
/// Splitmix64 finalizer over the mixed inputs.
pub fn job_seed(global: u64, pair: u64, entity: u64) -> u64 {
    let mut z = global
        ^ pair.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ entity.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Cosine of two sparse vectors over the union of their indices, absent
/// entries taken as zero. Both inputs must be sorted by index (CSR row
/// order). NaN when either norm vanishes.
pub fn sparse_cosine(x: &[(usize, f64)], y: &[(usize, f64)]) -> f64 {
    let norm_x: f64 = x.iter().map(|&(_, v)| v * v).sum();
    let norm_y: f64 = y.iter().map(|&(_, v)| v * v).sum();

    let mut dot = 0.0;
    let (mut a, mut b) = (0usize, 0usize);
    while a < x.len() && b < y.len() {
        match x[a].0.cmp(&y[b].0) {
            std::cmp::Ordering::Less => a += 1,
            std::cmp::Ordering::Greater => b += 1,
            std::cmp::Ordering::Equal => {
                dot += x[a].1 * y[b].1;
                a += 1;
                b += 1;
            }
        }
    }

    let denom = (norm_x * norm_y).sqrt();
    if denom < 1e-12 {
        f64::NAN
    } else {
        dot / denom
    }
}

/// Cosine of two dense vectors. NaN when either norm vanishes.
pub fn dense_cosine(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "dimension mismatch");
    let dot: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let norm_x: f64 = x.iter().map(|a| a * a).sum();
    let norm_y: f64 = y.iter().map(|b| b * b).sum();
    let denom = (norm_x * norm_y).sqrt();
    if denom < 1e-12 {
        f64::NAN
    } else {
        dot / denom
    }
}

/// BCa bootstrap of the cosine between two dense vectors.
///
/// Resamples `x.len()` zipped positions with replacement `trials` times,
/// computes the cosine of each resample (NaN handled per `nan`), and returns
/// the bias-corrected accelerated interval at `BOOTSTRAP_CONFIDENCE`. The
/// returned bounds always bracket the point estimate.
pub fn bca_bootstrap(
    x: &[f64],
    y: &[f64],
    trials: usize,
    seed: u64,
    nan: NanPolicy,
) -> Statistic {
    let n = x.len();
    let point = nan.resolve(dense_cosine(x, y));
    if n == 0 || trials == 0 {
        return Statistic::Bootstrap {
            point,
            lower: point,
            upper: point,
            level: BOOTSTRAP_CONFIDENCE,
        };
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let positions = Uniform::new(0, n).expect("non-empty resample range");

    let mut replicates = Vec::with_capacity(trials);
    for _ in 0..trials {
        let mut dot = 0.0;
        let mut norm_x = 0.0;
        let mut norm_y = 0.0;
        for _ in 0..n {
            let idx = positions.sample(&mut rng);
            dot += x[idx] * y[idx];
            norm_x += x[idx] * x[idx];
            norm_y += y[idx] * y[idx];
        }
        let denom = (norm_x * norm_y).sqrt();
        let c = if denom < 1e-12 { f64::NAN } else { dot / denom };
        replicates.push(nan.resolve(c));
    }

    // Bias correction from the fraction of replicates below the observed
    // value, clamped away from the degenerate 0/1 proportions.
    let below = replicates.iter().filter(|&&r| r < point).count() as f64;
    let p0 = (below / trials as f64)
        .clamp(1.0 / (trials as f64 + 1.0), trials as f64 / (trials as f64 + 1.0));
    let z0 = normal_quantile(p0);

    // Acceleration from the jackknife over positions; leave-one-out cosines
    // are computed from running sums.
    let full_dot: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let full_x: f64 = x.iter().map(|a| a * a).sum();
    let full_y: f64 = y.iter().map(|b| b * b).sum();
    let jack: Vec<f64> = (0..n)
        .map(|i| {
            let dot = full_dot - x[i] * y[i];
            let nx = full_x - x[i] * x[i];
            let ny = full_y - y[i] * y[i];
            let denom = (nx * ny).sqrt();
            let c = if denom < 1e-12 { f64::NAN } else { dot / denom };
            nan.resolve(c)
        })
        .collect();
    let jack_mean = jack.iter().sum::<f64>() / n as f64;
    let (mut d2, mut d3) = (0.0, 0.0);
    for &j in &jack {
        let d = jack_mean - j;
        d2 += d * d;
        d3 += d * d * d;
    }
    let accel = if d2 > 1e-24 {
        d3 / (6.0 * d2.powf(1.5))
    } else {
        0.0
    };

    let alpha = 1.0 - BOOTSTRAP_CONFIDENCE;
    let z_lo = normal_quantile(alpha / 2.0);
    let z_hi = normal_quantile(1.0 - alpha / 2.0);
    let adjusted = |z_a: f64| -> f64 {
        let num = z0 + z_a;
        normal_cdf(z0 + num / (1.0 - accel * num))
    };

    let mut sorted = replicates;
    sorted.sort_by(f64::total_cmp);
    let quantile = |p: f64| -> f64 {
        let idx = ((p * (trials as f64 - 1.0)).round() as usize).min(trials - 1);
        sorted[idx]
    };

    let lower = quantile(adjusted(z_lo)).min(point);
    let upper = quantile(adjusted(z_hi)).max(point);

    trace!(
        "BCa bootstrap: point={:.6}, lower={:.6}, upper={:.6}, z0={:.4}, a={:.4}",
        point,
        lower,
        upper,
        z0,
        accel
    );

    Statistic::Bootstrap {
        point,
        lower,
        upper,
        level: BOOTSTRAP_CONFIDENCE,
    }
}

/// Permutation p-value for the cosine of two sparse neighborhood vectors.
///
/// Shuffles the values of `y` among its own keys (preserving the value
/// multiset) `trials` times and counts how often the permuted cosine is at
/// least as extreme (in absolute value) as the observed one.
pub fn permutation_pvalue(
    x: &[(usize, f64)],
    y: &[(usize, f64)],
    trials: usize,
    seed: u64,
    nan: NanPolicy,
) -> Statistic {
    let observed = nan.resolve(sparse_cosine(x, y)).abs();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let keys: Vec<usize> = y.iter().map(|&(k, _)| k).collect();
    let mut values: Vec<f64> = y.iter().map(|&(_, v)| v).collect();

    let mut successes = 0usize;
    let mut shuffled = Vec::with_capacity(y.len());
    for _ in 0..trials {
        values.shuffle(&mut rng);
        shuffled.clear();
        shuffled.extend(keys.iter().copied().zip(values.iter().copied()));
        let c = nan.resolve(sparse_cosine(x, &shuffled));
        if c.abs() >= observed {
            successes += 1;
        }
    }

    Statistic::PValue(successes as f64 / trials as f64)
}

/// Standard normal CDF via the Abramowitz–Stegun erf approximation.
fn normal_cdf(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.2316419 * z.abs());
    let poly = t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    let tail = (-z * z / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt() * poly;
    if z >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Standard normal quantile, Acklam's rational approximation.
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    assert!(p > 0.0 && p < 1.0, "quantile domain: {}", p);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}
