//! Evaluation driver: every prompt in the prompt file, one after another.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::HarnessConfig;
use super::prompts::load_prompts;
use super::report::{write_json_atomic, EvaluationSummary, PromptEvaluation};
use super::sampler::SampleRunner;
use crate::error::HarnessError;
use crate::generation::{GenerationClient, HttpGenerationClient};
use crate::runner::Sandbox;

/// Report and summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Per-prompt results in prompt file order.
    pub report: Vec<PromptEvaluation>,
    /// Aggregate metrics.
    pub summary: EvaluationSummary,
}

/// Drives a full evaluation run.
pub struct EvaluationDriver<C> {
    config: HarnessConfig,
    runner: SampleRunner<C>,
    progress: bool,
}

impl EvaluationDriver<HttpGenerationClient> {
    /// Creates a driver talking to the configured HTTP endpoint.
    pub fn from_config(config: HarnessConfig) -> Result<Self, HarnessError> {
        let client = HttpGenerationClient::new(&config.service_url, config.request_timeout)?
            .with_max_retries(config.max_retries);
        Self::with_client(config, client)
    }
}

impl<C: GenerationClient> EvaluationDriver<C> {
    /// Creates a driver with an explicit generation client.
    ///
    /// The configuration is validated here, before any request is made.
    pub fn with_client(mut config: HarnessConfig, client: C) -> Result<Self, HarnessError> {
        config.validate()?;
        let runner = SampleRunner::new(client, Sandbox::new(config.sandbox_config()), config.ks.clone());
        Ok(Self {
            config,
            runner,
            progress: true,
        })
    }

    /// Enables or disables per-prompt progress lines on stdout.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every prompt and persists the report.
    ///
    /// Prompt file errors abort the run before any request. Sample failures
    /// never abort it. The report is written at the end, and after every
    /// prompt as well when incremental persistence is enabled.
    pub async fn run(&self) -> Result<EvaluationOutcome, HarnessError> {
        let prompts = load_prompts(&self.config.eval_file)?;
        if prompts.is_empty() {
            return Err(HarnessError::NoPrompts(self.config.eval_file.clone()));
        }

        info!(
            prompts = prompts.len(),
            n_samples = self.config.n_samples,
            ks = ?self.config.ks,
            "Starting evaluation"
        );

        let mut report = Vec::with_capacity(prompts.len());
        for record in &prompts {
            if self.progress {
                println!("Evaluating: {}", record.id);
            }

            let evaluation = self
                .runner
                .evaluate(record, self.config.n_samples, self.config.temperature)
                .await;

            if self.progress {
                println!(
                    " -> {} pass_ratio: {}",
                    evaluation.passk_display(),
                    evaluation.pass_ratio
                );
            }
            report.push(evaluation);

            if self.config.incremental {
                write_json_atomic(&self.config.output, &report)?;
                debug!(completed = report.len(), "Checkpointed report");
            }
        }

        let summary = EvaluationSummary::from_report(&report, &self.config.ks);

        write_json_atomic(&self.config.output, &report)?;
        info!(path = %self.config.output.display(), "Report written");

        if let Some(path) = &self.config.summary_output {
            write_json_atomic(path, &summary)?;
            info!(path = %path.display(), "Summary written");
        }

        Ok(EvaluationOutcome { report, summary })
    }
}
