//! HTTP client for the code-generation endpoint.
//!
//! Requests are posted form-encoded (`user_task`, `language`, `run_tests`,
//! `temperature`); the response body must be a JSON object.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{GenerationClient, GenerationRequest};
use crate::error::GenerationError;

/// Default generation endpoint.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000/generate_code";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Base delay for exponential backoff in milliseconds.
const BASE_RETRY_DELAY_MS: u64 = 500;

/// Generation client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    /// HTTP client for making requests.
    client: Client,
    /// Full URL of the generation endpoint.
    endpoint: String,
    /// Per-request timeout.
    timeout: Duration,
    /// Extra attempts after a transient failure.
    max_retries: u32,
}

impl HttpGenerationClient {
    /// Creates a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
            max_retries: 0,
        })
    }

    /// Retries transient failures up to `max_retries` extra times.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute_request(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        let http_response = self
            .client
            .post(&self.endpoint)
            .form(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = http_response.status();
        if !status.is_success() {
            let message = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(GenerationError::ApiError {
                code: status.as_u16(),
                message,
            });
        }

        let body = http_response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GenerationError::ParseError(format!("Response is not JSON: {}", e)))?;

        if !value.is_object() {
            return Err(GenerationError::ParseError(
                "Response is not a JSON object".to_string(),
            ));
        }

        Ok(value)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::from(err)
        }
    }
}

/// Check if an error is transient and worth retrying.
fn is_transient_error(error: &GenerationError) -> bool {
    match error {
        GenerationError::RequestFailed(_) | GenerationError::Timeout(_) => true,
        GenerationError::ApiError { code, .. } => *code >= 500 || *code == 429,
        GenerationError::ParseError(_) => false,
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.execute_request(request).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && is_transient_error(&err) => {
                    attempt += 1;
                    let delay_ms = BASE_RETRY_DELAY_MS * (1 << (attempt - 1).min(6));
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Transient generation failure, will retry"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => {
                    debug!(error = %err, "Generation request failed");
                    return Err(err);
                }
            }
        }
    }
}
