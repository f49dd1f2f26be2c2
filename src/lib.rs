//! passk-eval: pass@k evaluation harness for code generation services.
//!
//! This library loads evaluation prompts, samples candidate programs from a
//! generation service, executes them against per-prompt test scripts in an
//! isolated sandbox and aggregates pass@k and latency metrics.

pub mod cli;
pub mod error;
pub mod generation;
pub mod harness;
pub mod metrics;
pub mod runner;
pub mod utils;

// Re-export commonly used error types
pub use error::{ConfigError, GenerationError, HarnessError, SandboxError};
