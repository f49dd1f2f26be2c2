//! Client side of the code-generation service.
//!
//! The harness only sees the service through [`GenerationClient`]: one
//! request in, one JSON object out. The service itself (retrieval, prompt
//! construction, the hosted model) is a black box.
//!
//! ```ignore
//! use std::time::Duration;
//! use passk_eval::generation::{GenerationClient, GenerationRequest, HttpGenerationClient};
//!
//! let client = HttpGenerationClient::new("http://127.0.0.1:8000/generate_code", Duration::from_secs(60))?;
//! let request = GenerationRequest::new("Write add(a, b)").with_temperature(0.7);
//! let response = client.generate(&request).await?;
//! ```

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;

pub use http::{HttpGenerationClient, DEFAULT_SERVICE_URL};

/// Default language sent with each request.
pub const DEFAULT_LANGUAGE: &str = "python";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Payload of one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Natural-language task description.
    pub user_task: String,
    /// Target language of the generated code.
    pub language: String,
    /// Whether the service should run its own tests.
    pub run_tests: bool,
    /// Sampling temperature.
    pub temperature: f64,
}

impl GenerationRequest {
    /// Creates a request with default language, temperature and `run_tests = false`.
    pub fn new(user_task: impl Into<String>) -> Self {
        Self {
            user_task: user_task.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            run_tests: false,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Sets the target language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for generation service clients.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends one request and returns the decoded response object.
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = GenerationRequest::new("add two numbers");
        assert_eq!(request.user_task, "add two numbers");
        assert_eq!(request.language, "python");
        assert!(!request.run_tests);
        assert_eq!(request.temperature, 0.7);
    }

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("reverse a string")
            .with_language("rust")
            .with_temperature(0.2);
        assert_eq!(request.language, "rust");
        assert_eq!(request.temperature, 0.2);
    }
}
