//! Configuration for evaluation runs.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::generation::http::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVICE_URL};
use crate::generation::DEFAULT_TEMPERATURE;
use crate::runner::sandbox::{
    is_bare_file_name, DEFAULT_INTERPRETER, DEFAULT_MODULE_FILENAME, DEFAULT_TIMEOUT,
};
use crate::runner::SandboxConfig;

/// Default prompt file.
pub const DEFAULT_EVAL_FILE: &str = "tests/eval_prompts.jsonl";

/// Default report path.
pub const DEFAULT_OUTPUT: &str = "eval_results.json";

/// Default number of generations per prompt.
pub const DEFAULT_N_SAMPLES: usize = 10;

/// Default k values for pass@k.
pub const DEFAULT_KS: &[usize] = &[1, 3, 5];

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Generation endpoint URL.
    pub service_url: String,
    /// JSONL file of prompt records.
    pub eval_file: PathBuf,
    /// Where the report is written.
    pub output: PathBuf,
    /// Where the run summary is written, if anywhere.
    pub summary_output: Option<PathBuf>,
    /// Generations per prompt (n in pass@k).
    pub n_samples: usize,
    /// k values for pass@k.
    pub ks: Vec<usize>,
    /// Sampling temperature sent with each request.
    pub temperature: f64,
    /// Timeout for one generation request.
    pub request_timeout: Duration,
    /// Extra attempts after a transient generation failure.
    pub max_retries: u32,
    /// Timeout for one test script run.
    pub test_timeout: Duration,
    /// Interpreter for test scripts.
    pub interpreter: String,
    /// File name the candidate source is written to.
    pub module_filename: String,
    /// Rewrite the report after every prompt.
    pub incremental: bool,
}

impl HarnessConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            eval_file: PathBuf::from(DEFAULT_EVAL_FILE),
            output: PathBuf::from(DEFAULT_OUTPUT),
            summary_output: None,
            n_samples: DEFAULT_N_SAMPLES,
            ks: DEFAULT_KS.to_vec(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: 0,
            test_timeout: DEFAULT_TIMEOUT,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            module_filename: DEFAULT_MODULE_FILENAME.to_string(),
            incremental: false,
        }
    }

    /// Sets the generation endpoint.
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    /// Sets the prompt file.
    pub fn with_eval_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.eval_file = path.into();
        self
    }

    /// Sets the report path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Sets the summary path.
    pub fn with_summary_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_output = Some(path.into());
        self
    }

    /// Sets the number of samples per prompt.
    pub fn with_n_samples(mut self, n: usize) -> Self {
        self.n_samples = n;
        self
    }

    /// Sets the k values.
    pub fn with_ks(mut self, ks: Vec<usize>) -> Self {
        self.ks = ks;
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generation request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the transient failure retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the test script timeout.
    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Sets the interpreter.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Sets the file name the candidate source is written to.
    pub fn with_module_filename(mut self, filename: impl Into<String>) -> Self {
        self.module_filename = filename.into();
        self
    }

    /// Enables or disables incremental report writes.
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Builds the sandbox configuration for this run.
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig::new()
            .with_interpreter(&self.interpreter)
            .with_module_filename(&self.module_filename)
            .with_timeout(self.test_timeout)
    }

    /// Checks the configuration before any request is made.
    ///
    /// Every k must lie in `1..=n_samples`; k values are deduplicated and
    /// sorted on success.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.n_samples == 0 {
            return Err(invalid("n_samples", "must be at least 1"));
        }
        if self.ks.is_empty() {
            return Err(invalid("ks", "at least one k value is required"));
        }
        if let Some(&k) = self.ks.iter().find(|&&k| k == 0 || k > self.n_samples) {
            return Err(invalid(
                "ks",
                format!("k={} is outside 1..={} (n_samples)", k, self.n_samples),
            ));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(invalid("temperature", "must be a non-negative number"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout", "must be greater than zero"));
        }
        if self.test_timeout.is_zero() {
            return Err(invalid("test_timeout", "must be greater than zero"));
        }
        if self.service_url.trim().is_empty() {
            return Err(invalid("service_url", "must not be empty"));
        }
        if self.interpreter.trim().is_empty() {
            return Err(invalid("interpreter", "must not be empty"));
        }
        if !is_bare_file_name(&self.module_filename) {
            return Err(invalid("module_filename", "must be a bare file name"));
        }
        if let Some(summary) = &self.summary_output {
            if normalize_path(summary) == normalize_path(&self.output) {
                return Err(ConfigError::ValidationFailed(
                    "summary output and report output must be different files".to_string(),
                ));
            }
        }

        self.ks.sort_unstable();
        self.ks.dedup();
        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute, lexically normalized form of `path`, used to compare output
/// destinations. Symlinks are not resolved.
fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Parses a comma-separated list of k values such as `"1,3,5"`.
pub fn parse_ks(input: &str) -> Result<Vec<usize>, ConfigError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|e| invalid("ks", format!("'{}' is not a positive integer: {}", part, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.service_url, "http://127.0.0.1:8000/generate_code");
        assert_eq!(config.eval_file, PathBuf::from("tests/eval_prompts.jsonl"));
        assert_eq!(config.output, PathBuf::from("eval_results.json"));
        assert_eq!(config.n_samples, 10);
        assert_eq!(config.ks, vec![1, 3, 5]);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.test_timeout, Duration::from_secs(10));
        assert!(!config.incremental);
    }

    #[test]
    fn test_defaults_are_valid() {
        let mut config = HarnessConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_k_above_n() {
        let mut config = HarnessConfig::new().with_n_samples(3).with_ks(vec![1, 5]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("k=5"));
    }

    #[test]
    fn test_validate_rejects_zero_k_and_zero_n() {
        let mut config = HarnessConfig::new().with_ks(vec![0]);
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new().with_n_samples(0).with_ks(vec![1]);
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new().with_ks(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_timeouts() {
        let mut config = HarnessConfig::new().with_test_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_temperature() {
        let mut config = HarnessConfig::new().with_temperature(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_summary_overwriting_report() {
        let mut config = HarnessConfig::new()
            .with_output("out.json")
            .with_summary_output("out.json");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_compares_normalized_output_paths() {
        let mut config = HarnessConfig::new()
            .with_output("out.json")
            .with_summary_output("./out.json");
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new()
            .with_output("reports/../out.json")
            .with_summary_output("out.json");
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::new()
            .with_output("out.json")
            .with_summary_output("./summary.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_module_filename_with_directories() {
        for name in ["../escape.py", "sub/mod.py", "..", ""] {
            let mut config = HarnessConfig::new().with_module_filename(name);
            assert!(config.validate().is_err(), "{name:?} should be rejected");
        }

        let mut config = HarnessConfig::new().with_module_filename("solution.py");
        assert!(config.validate().is_ok());
        assert_eq!(config.sandbox_config().module_filename, "solution.py");
    }

    #[test]
    fn test_validate_sorts_and_dedups_ks() {
        let mut config = HarnessConfig::new().with_ks(vec![5, 1, 3, 1]);
        config.validate().unwrap();
        assert_eq!(config.ks, vec![1, 3, 5]);
    }

    #[test]
    fn test_parse_ks() {
        assert_eq!(parse_ks("1,3,5").unwrap(), vec![1, 3, 5]);
        assert_eq!(parse_ks(" 1 , 10 ,").unwrap(), vec![1, 10]);
        assert!(parse_ks("1,x").is_err());
        assert!(parse_ks("-1").is_err());
    }

    #[test]
    fn test_sandbox_config_from_harness_config() {
        let config = HarnessConfig::new()
            .with_interpreter("python3.12")
            .with_test_timeout(Duration::from_secs(4));
        let sandbox = config.sandbox_config();
        assert_eq!(sandbox.interpreter, "python3.12");
        assert_eq!(sandbox.module_filename, "generated_code.py");
        assert_eq!(sandbox.timeout, Duration::from_secs(4));
    }
}
