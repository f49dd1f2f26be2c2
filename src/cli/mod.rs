//! Command-line interface for passk-eval.
//!
//! Provides the `evaluate` command for full pass@k runs and the `exec`
//! command for checking a single candidate against a test script.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, EvaluateArgs, ExecArgs};
