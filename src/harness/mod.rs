//! Evaluation harness.
//!
//! Loads prompt records, draws N generations per prompt from the generation
//! service, runs each candidate against the prompt's test script and records
//! per-prompt pass@k alongside latency statistics.
//!
//! # Example
//!
//! ```ignore
//! use passk_eval::harness::{EvaluationDriver, HarnessConfig};
//!
//! let config = HarnessConfig::new()
//!     .with_eval_file("tests/eval_prompts.jsonl")
//!     .with_n_samples(5)
//!     .with_ks(vec![1, 5]);
//!
//! let outcome = EvaluationDriver::from_config(config)?.run().await?;
//! println!("{}", outcome.summary.render());
//! ```

pub mod config;
pub mod driver;
pub mod prompts;
pub mod report;
pub mod sampler;

pub use config::{parse_ks, HarnessConfig};
pub use driver::{EvaluationDriver, EvaluationOutcome};
pub use prompts::{load_prompts, PromptRecord};
pub use report::{read_report, write_json_atomic, EvaluationSummary, PassAtKSummary, PromptEvaluation};
pub use sampler::SampleRunner;
