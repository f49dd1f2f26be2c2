//! Sample runner: N generations for one prompt, each executed in the sandbox.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::prompts::PromptRecord;
use super::report::PromptEvaluation;
use crate::generation::{GenerationClient, GenerationRequest};
use crate::runner::{Sandbox, SampleResult};
use crate::utils::code_extraction::extract_code_from_response;

/// Runs the sampling loop for one prompt at a time.
///
/// Samples are strictly sequential: each request, extraction and test run
/// completes before the next request is sent.
pub struct SampleRunner<C> {
    client: C,
    sandbox: Sandbox,
    ks: Vec<usize>,
}

impl<C: GenerationClient> SampleRunner<C> {
    /// Creates a runner. `ks` should already be validated against the sample count.
    pub fn new(client: C, sandbox: Sandbox, ks: Vec<usize>) -> Self {
        Self {
            client,
            sandbox,
            ks,
        }
    }

    /// Returns the generation client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Draws `n_samples` generations for `record` and evaluates them.
    ///
    /// A failed sample of any kind is recorded as `false` and the loop
    /// continues; this never fails.
    pub async fn evaluate(
        &self,
        record: &PromptRecord,
        n_samples: usize,
        temperature: f64,
    ) -> PromptEvaluation {
        let request = GenerationRequest::new(&record.prompt)
            .with_language(&record.language)
            .with_temperature(temperature);

        let mut samples = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let sample = self.run_sample(&request, record).await;
            debug!(
                prompt_id = %record.id,
                sample = i + 1,
                passed = sample.passed,
                latency_secs = sample.latency_secs,
                "Sample finished"
            );
            samples.push(sample);
        }

        let evaluation = PromptEvaluation::from_samples(&record.id, samples, &self.ks);
        info!(
            prompt_id = %record.id,
            pass_ratio = evaluation.pass_ratio,
            "Prompt evaluated"
        );
        evaluation
    }

    /// Latency is the wall time of the whole `generate` call, retries and
    /// backoff included.
    async fn run_sample(&self, request: &GenerationRequest, record: &PromptRecord) -> SampleResult {
        let start = Instant::now();
        let response = self.client.generate(request).await;
        let latency_secs = start.elapsed().as_secs_f64();

        match response {
            Ok(body) => {
                let code = extract_code_from_response(&body);
                self.sandbox
                    .execute(&code, &record.test_script)
                    .await
                    .with_latency(latency_secs)
            }
            Err(e) => {
                warn!(prompt_id = %record.id, error = %e, "Generation request failed");
                SampleResult::failure(format!("Generation failed: {}", e)).with_latency(latency_secs)
            }
        }
    }
}
