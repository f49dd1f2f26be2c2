//! Evaluation results, run summary and their persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::HarnessError;
use crate::metrics::{mean, pass_at_k_estimate, SampleStats};
use crate::runner::SampleResult;

/// Metrics for one prompt.
///
/// Built only through [`PromptEvaluation::from_samples`], so
/// `samples_results.len() == n_samples` and `passk`/`pass_ratio` always agree
/// with `samples_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEvaluation {
    /// Prompt identifier.
    pub id: String,
    /// Number of generations drawn.
    pub n_samples: usize,
    /// Fraction of samples that passed.
    pub pass_ratio: f64,
    /// Whether any of the first k samples passed, per k.
    pub passk: BTreeMap<usize, bool>,
    /// Mean generation latency, in seconds.
    pub latency_mean: f64,
    /// 95th percentile generation latency, in seconds.
    pub latency_p95: f64,
    /// Pass/fail per sample, in request order.
    pub samples_results: Vec<bool>,
    /// Diagnostics per sample, in request order.
    #[serde(default)]
    pub samples: Vec<SampleResult>,
}

impl PromptEvaluation {
    /// Aggregates the ordered samples of one prompt.
    pub fn from_samples(id: impl Into<String>, samples: Vec<SampleResult>, ks: &[usize]) -> Self {
        let passed: Vec<bool> = samples.iter().map(|s| s.passed).collect();
        let latencies: Vec<f64> = samples.iter().map(|s| s.latency_secs).collect();
        let stats = SampleStats::compute(&passed, &latencies, ks);

        Self {
            id: id.into(),
            n_samples: samples.len(),
            pass_ratio: stats.pass_ratio,
            passk: stats.passk,
            latency_mean: stats.latency_mean,
            latency_p95: stats.latency_p95,
            samples_results: passed,
            samples,
        }
    }

    /// Number of samples that passed.
    pub fn passed_count(&self) -> usize {
        self.samples_results.iter().filter(|&&p| p).count()
    }

    /// Formats the passk map as `{1: false, 3: true}`.
    pub fn passk_display(&self) -> String {
        let parts: Vec<String> = self
            .passk
            .iter()
            .map(|(k, passed)| format!("{}: {}", k, passed))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// Aggregate pass@k for one k across all prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassAtKSummary {
    /// Prompts whose first k samples contained a pass.
    pub succeeded: usize,
    /// Prompts evaluated.
    pub total: usize,
    /// `succeeded / total`.
    pub ratio: f64,
    /// Mean unbiased pass@k estimate over prompts.
    pub estimate: f64,
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Identifier of the run this summary belongs to.
    pub run_id: Uuid,
    /// When the summary was computed.
    pub generated_at: DateTime<Utc>,
    /// Prompts evaluated.
    pub total_prompts: usize,
    /// Total samples drawn across prompts.
    pub total_samples: usize,
    /// Aggregate pass@k per k.
    pub passk: BTreeMap<usize, PassAtKSummary>,
    /// Mean of per-prompt pass ratios.
    pub mean_pass_ratio: f64,
    /// Mean of per-prompt mean latencies, in seconds.
    pub mean_latency: f64,
}

impl EvaluationSummary {
    /// Summarizes a report.
    pub fn from_report(report: &[PromptEvaluation], ks: &[usize]) -> Self {
        let total = report.len();
        let passk = ks
            .iter()
            .map(|&k| {
                let succeeded = report
                    .iter()
                    .filter(|e| e.passk.get(&k).copied().unwrap_or(false))
                    .count();
                let estimates: Vec<f64> = report
                    .iter()
                    .map(|e| pass_at_k_estimate(e.n_samples, e.passed_count(), k))
                    .collect();
                let summary = PassAtKSummary {
                    succeeded,
                    total,
                    ratio: if total > 0 {
                        succeeded as f64 / total as f64
                    } else {
                        0.0
                    },
                    estimate: mean(&estimates),
                };
                (k, summary)
            })
            .collect();

        let pass_ratios: Vec<f64> = report.iter().map(|e| e.pass_ratio).collect();
        let latencies: Vec<f64> = report.iter().map(|e| e.latency_mean).collect();

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total_prompts: total,
            total_samples: report.iter().map(|e| e.n_samples).sum(),
            passk,
            mean_pass_ratio: mean(&pass_ratios),
            mean_latency: mean(&latencies),
        }
    }

    /// Renders the operator-facing summary block.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Run: {}", self.run_id)];
        lines.extend(self.passk.iter().map(|(k, s)| {
            format!(
                "pass@{}: {}/{} = {:.3} (estimate {:.3})",
                k, s.succeeded, s.total, s.ratio, s.estimate
            )
        }));
        lines.push(format!("Mean pass_ratio@n: {}", self.mean_pass_ratio));
        lines.push(format!("Mean latency: {:.3}s", self.mean_latency));
        lines.join("\n")
    }
}

/// Writes `value` as pretty JSON to `path`, replacing any previous file.
///
/// The data goes to a sibling temp file first and is renamed into place, so
/// readers never see a half-written report.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), HarnessError> {
    let data = serde_json::to_string_pretty(value)?;
    let persist_err = |source: std::io::Error| HarnessError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, data).map_err(persist_err)?;
    fs::rename(&tmp_path, path).map_err(persist_err)?;
    debug!(path = %path.display(), "Wrote JSON artifact");
    Ok(())
}

/// Reads a persisted report back.
pub fn read_report(path: &Path) -> Result<Vec<PromptEvaluation>, HarnessError> {
    let data = fs::read_to_string(path).map_err(|source| HarnessError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&data)?)
}
