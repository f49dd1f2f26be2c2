//! Sandbox environment for executing generated code against a test script.
//!
//! Each execution gets a fresh temporary directory holding exactly two files:
//! the candidate source, written under a fixed module name so the test's
//! import resolves, and an unmodified copy of the test script. The script
//! runs as a child process with captured output and a hard wall-clock
//! timeout. The directory is removed when the execution returns, whatever
//! the outcome.

use std::path::{Component, Path};
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use super::result::SampleResult;
use crate::error::SandboxError;

/// Default interpreter used to run test scripts.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// File name the candidate source is written to.
pub const DEFAULT_MODULE_FILENAME: &str = "generated_code.py";

/// Default wall-clock limit for one test script run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment every test script runs with. Keeps `__pycache__` out of the
/// sandbox directory.
const DEFAULT_ENV: &[(&str, &str)] = &[("PYTHONDONTWRITEBYTECODE", "1")];

/// Returns true if `name` is a single plain file name with no directory part.
pub fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Configuration for the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Program that runs the test script.
    pub interpreter: String,
    /// File name for the candidate source inside the sandbox.
    pub module_filename: String,
    /// Timeout for one test script run.
    pub timeout: Duration,
    /// Environment variables passed to the test script.
    pub env_vars: Vec<(String, String)>,
}

impl SandboxConfig {
    /// Creates a new sandbox configuration with defaults.
    pub fn new() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            module_filename: DEFAULT_MODULE_FILENAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            env_vars: DEFAULT_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Sets the interpreter.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Sets the module file name.
    pub fn with_module_filename(mut self, filename: impl Into<String>) -> Self {
        self.module_filename = filename.into();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs candidate code against test scripts in disposable directories.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    /// Creates a new sandbox with the given configuration.
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Returns the sandbox configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Executes `code` against `test_script`.
    ///
    /// Never returns an error: setup failures, spawn failures and timeouts
    /// all become a failed [`SampleResult`] carrying the error description.
    pub async fn execute(&self, code: &str, test_script: &Path) -> SampleResult {
        match self.try_execute(code, test_script).await {
            Ok(result) => result,
            Err(SandboxError::Timeout(limit)) => {
                warn!(script = %test_script.display(), ?limit, "Test script timed out");
                SampleResult::timeout(SandboxError::Timeout(limit).to_string())
            }
            Err(e) => {
                warn!(script = %test_script.display(), error = %e, "Sandbox execution failed");
                SampleResult::failure(e.to_string())
            }
        }
    }

    async fn try_execute(&self, code: &str, test_script: &Path) -> Result<SampleResult, SandboxError> {
        let workdir = TempDir::with_prefix("passk-sandbox-")
            .map_err(|e| SandboxError::Setup(format!("Failed to create temp dir: {}", e)))?;
        self.stage(workdir.path(), code, test_script).await?;

        let script_name = test_script
            .file_name()
            .ok_or_else(|| SandboxError::Setup("Test script path has no file name".to_string()))?;
        let script_path = workdir.path().join(script_name);

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&script_path)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &self.config.env_vars {
            cmd.env(key, value);
        }

        debug!(
            "Running {} {} in {}",
            self.config.interpreter,
            script_path.display(),
            workdir.path().display()
        );

        let child = cmd.spawn().map_err(|e| SandboxError::Spawn {
            program: self.config.interpreter.clone(),
            reason: e.to_string(),
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| SandboxError::Timeout(self.config.timeout))??;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!("Test script exited with code {}", exit_code);

        Ok(SampleResult::completed(
            exit_code,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        ))
    }

    /// Writes the candidate source and copies the test script into `dir`.
    async fn stage(&self, dir: &Path, code: &str, test_script: &Path) -> Result<(), SandboxError> {
        if !is_bare_file_name(&self.config.module_filename) {
            return Err(SandboxError::Setup(format!(
                "Module file name '{}' must be a bare file name",
                self.config.module_filename
            )));
        }
        let script_name = test_script
            .file_name()
            .ok_or_else(|| SandboxError::Setup("Test script path has no file name".to_string()))?;
        if script_name == self.config.module_filename.as_str() {
            return Err(SandboxError::Setup(format!(
                "Test script name '{}' collides with the module file name",
                self.config.module_filename
            )));
        }

        tokio::fs::write(dir.join(&self.config.module_filename), code)
            .await
            .map_err(|e| SandboxError::Setup(format!("Failed to write candidate source: {}", e)))?;

        tokio::fs::copy(test_script, dir.join(script_name))
            .await
            .map_err(|e| {
                SandboxError::Setup(format!(
                    "Failed to copy test script {}: {}",
                    test_script.display(),
                    e
                ))
            })?;

        Ok(())
    }
}
