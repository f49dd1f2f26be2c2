//! Per-sample execution results.

use serde::{Deserialize, Serialize};

/// Maximum bytes of stdout/stderr kept per sample.
pub const MAX_CAPTURE_BYTES: usize = 10_000;

/// Outcome of one generation attempt run against its test script.
///
/// A sample passes only when the test script exits with status zero. Every
/// other outcome (generation failure, spawn failure, timeout, non-zero exit)
/// is a failed sample; the diagnostic fields say why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    /// Whether the test script exited with status zero.
    pub passed: bool,
    /// Captured stdout (truncated if too long).
    pub stdout: String,
    /// Captured stderr (truncated if too long).
    pub stderr: String,
    /// Exit code of the test script, or -1 when there is none.
    pub exit_code: i32,
    /// Description of the failure when the script could not run to completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock latency of the generation request, in seconds.
    #[serde(default)]
    pub latency_secs: f64,
    /// Whether the test script was killed at the timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl SampleResult {
    /// Creates a result from a completed test script process.
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            passed: exit_code == 0,
            stdout: truncate_string(stdout.into(), MAX_CAPTURE_BYTES),
            stderr: truncate_string(stderr.into(), MAX_CAPTURE_BYTES),
            exit_code,
            error: None,
            latency_secs: 0.0,
            timed_out: false,
        }
    }

    /// Creates a failed result for a sample that never produced an exit status.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            passed: false,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: -1,
            error: Some(error.into()),
            latency_secs: 0.0,
            timed_out: false,
        }
    }

    /// Creates a failed result for a test script killed at the timeout.
    pub fn timeout(error: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::failure(error)
        }
    }

    /// Sets the generation latency.
    pub fn with_latency(mut self, latency_secs: f64) -> Self {
        self.latency_secs = latency_secs;
        self
    }
}

/// Truncates a string to at most `max_len` bytes on a char boundary.
fn truncate_string(s: String, max_len: usize) -> String {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
