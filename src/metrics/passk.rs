//! pass@k and latency statistics over a prompt's samples.
//!
//! All functions here are pure. `samples` is always the pass/fail vector in
//! the order the generation requests were issued; pass@k looks at the first
//! k attempts, not a random subset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Summary statistics for one prompt's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    /// Fraction of samples that passed.
    pub pass_ratio: f64,
    /// Whether any of the first k samples passed, per k.
    pub passk: BTreeMap<usize, bool>,
    /// Arithmetic mean latency, in seconds.
    pub latency_mean: f64,
    /// 95th percentile latency (nearest rank), in seconds.
    pub latency_p95: f64,
}

impl SampleStats {
    /// Computes all statistics for one prompt.
    ///
    /// `ks` should already be validated against the sample count; a k larger
    /// than `samples.len()` is treated as `samples.len()`.
    pub fn compute(samples: &[bool], latencies: &[f64], ks: &[usize]) -> Self {
        Self {
            pass_ratio: pass_ratio(samples),
            passk: ks.iter().map(|&k| (k, pass_at_k(samples, k))).collect(),
            latency_mean: mean(latencies),
            latency_p95: latency_p95(latencies),
        }
    }
}

/// Returns true iff any of the first `k` samples passed.
///
/// `k` past the end of `samples` is clamped to its length.
pub fn pass_at_k(samples: &[bool], k: usize) -> bool {
    samples.iter().take(k).any(|&passed| passed)
}

/// Fraction of samples that passed; 0.0 for an empty vector.
pub fn pass_ratio(samples: &[bool]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().filter(|&&passed| passed).count() as f64 / samples.len() as f64
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Index of the 95th percentile in a sorted vector of length `n`.
///
/// Rank is `floor(0.95 * n)` in exact integer arithmetic, at least 1, so
/// ten values select index 8 and a single value selects index 0.
pub fn p95_index(n: usize) -> usize {
    ((n * 95) / 100).max(1) - 1
}

/// 95th percentile latency by nearest rank; 0.0 for an empty slice.
pub fn latency_p95(latencies: &[f64]) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[p95_index(sorted.len())]
}

/// Unbiased pass@k estimate from `n` samples of which `c` passed.
///
/// Computes `1 - C(n-c, k) / C(n, k)` as a running product so large `n`
/// does not overflow.
pub fn pass_at_k_estimate(n: usize, c: usize, k: usize) -> f64 {
    if c == 0 {
        return 0.0;
    }
    if n.saturating_sub(c) < k {
        return 1.0;
    }
    let miss_all: f64 = ((n - c + 1)..=n)
        .map(|i| 1.0 - k as f64 / i as f64)
        .product();
    1.0 - miss_all
}
