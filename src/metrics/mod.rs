//! Success and latency metrics for evaluation runs.
//!
//! - [`passk`] - Prefix pass@k, pass ratio, nearest-rank latency percentiles
//!   and the unbiased pass@k estimator.

pub mod passk;

pub use passk::{
    latency_p95, mean, p95_index, pass_at_k, pass_at_k_estimate, pass_ratio, SampleStats,
};
