//! Error types for passk-eval operations.
//!
//! Defines the error types for each subsystem:
//! - Generation service requests
//! - Sandboxed test execution
//! - Harness configuration
//! - Prompt loading and report persistence
//!
//! Sample-level errors (generation, sandbox) never escape the sample runner;
//! they are folded into a failed sample. Harness and configuration errors are
//! fatal for the run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Failed to parse generation response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::ParseError(err.to_string())
        } else {
            GenerationError::RequestFailed(err.to_string())
        }
    }
}

/// Errors that can occur while executing a candidate in the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("Test script timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while validating harness configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Fatal errors that abort an evaluation run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to read prompt file '{path}': {source}")]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed prompt record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prompt file '{0}' contains no prompt records")]
    NoPrompts(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create generation client: {0}")]
    Client(#[from] GenerationError),

    #[error("Failed to persist '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GenerationError::ApiError {
            code: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "API error (503): unavailable");

        let err = SandboxError::Spawn {
            program: "python3".to_string(),
            reason: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to spawn 'python3': not found");

        let err = HarnessError::NoPrompts(PathBuf::from("prompts.jsonl"));
        assert!(err.to_string().contains("prompts.jsonl"));
    }

    #[test]
    fn test_config_error_converts_to_harness_error() {
        let err: HarnessError = ConfigError::ValidationFailed("k must be positive".into()).into();
        assert!(matches!(err, HarnessError::Config(_)));
        assert!(err.to_string().contains("k must be positive"));
    }
}
