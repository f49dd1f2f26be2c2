//! CLI command definitions for passk-eval.
//!
//! `evaluate` runs the full pass@k harness over a prompt file; `exec` runs a
//! single candidate file against a test script in the sandbox.

use crate::generation::http::DEFAULT_SERVICE_URL;
use crate::harness::config::{DEFAULT_EVAL_FILE, DEFAULT_N_SAMPLES, DEFAULT_OUTPUT};
use crate::harness::{parse_ks, EvaluationDriver, HarnessConfig};
use crate::runner::sandbox::{is_bare_file_name, DEFAULT_INTERPRETER, DEFAULT_MODULE_FILENAME};
use crate::runner::{Sandbox, SandboxConfig};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default k values on the command line.
const DEFAULT_KS_ARG: &str = "1,3,5";

/// Default generation request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default test script timeout in seconds.
const DEFAULT_TEST_TIMEOUT_SECS: u64 = 10;

/// pass@k evaluation harness for code generation services.
#[derive(Parser)]
#[command(name = "passk-eval")]
#[command(about = "Measure pass@k of a code generation service against test scripts")]
#[command(version)]
#[command(
    long_about = "passk-eval draws N generations per prompt from a code generation service, runs each candidate against the prompt's test script in an isolated temporary directory, and reports pass@k and latency.\n\nExample usage:\n  passk-eval evaluate --eval-file tests/eval_prompts.jsonl --n-samples 10 --ks 1,3,5"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Evaluate a generation service over a prompt file.
    ///
    /// Each prompt gets N sequential generations. Every candidate runs
    /// against the prompt's test script and the per-prompt pass@k, pass ratio
    /// and latency statistics are written to the output report.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Run one candidate source file against a test script.
    Exec(ExecArgs),
}

/// Arguments for the evaluate command.
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Generation endpoint URL.
    #[arg(long, env = "PASSK_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    pub service_url: String,

    /// JSONL prompt file (one {"id", "prompt", "language", "test_script"} per line).
    #[arg(short = 'f', long, env = "PASSK_EVAL_FILE", default_value = DEFAULT_EVAL_FILE)]
    pub eval_file: PathBuf,

    /// Output file for the per-prompt report (JSON).
    #[arg(short = 'o', long, env = "PASSK_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Optional output file for the run summary (JSON).
    #[arg(long, env = "PASSK_SUMMARY_OUTPUT")]
    pub summary_output: Option<PathBuf>,

    /// Number of generations per prompt.
    #[arg(short = 'n', long, env = "PASSK_N_SAMPLES", default_value_t = DEFAULT_N_SAMPLES)]
    pub n_samples: usize,

    /// Comma-separated k values for pass@k.
    #[arg(short = 'k', long, env = "PASSK_KS", default_value = DEFAULT_KS_ARG)]
    pub ks: String,

    /// Sampling temperature sent with each request.
    #[arg(short = 't', long, env = "PASSK_TEMPERATURE", default_value_t = crate::generation::DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    /// Timeout in seconds for one generation request.
    #[arg(long, env = "PASSK_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Timeout in seconds for one test script run.
    #[arg(long, env = "PASSK_TEST_TIMEOUT", default_value_t = DEFAULT_TEST_TIMEOUT_SECS)]
    pub test_timeout: u64,

    /// Extra attempts after a transient generation failure.
    #[arg(long, env = "PASSK_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,

    /// Interpreter used to run test scripts.
    #[arg(long, env = "PASSK_INTERPRETER", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// File name the candidate is written to inside the sandbox.
    #[arg(long, env = "PASSK_MODULE_FILENAME", default_value = DEFAULT_MODULE_FILENAME)]
    pub module_filename: String,

    /// Rewrite the report after every prompt.
    #[arg(long)]
    pub incremental: bool,

    /// Output the report and summary as JSON to stdout instead of progress lines.
    #[arg(short = 'j', long)]
    pub json: bool,
}

impl EvaluateArgs {
    /// Builds the harness configuration. Validation happens in the driver.
    pub fn to_config(&self) -> anyhow::Result<HarnessConfig> {
        let ks = parse_ks(&self.ks)?;
        let mut config = HarnessConfig::new()
            .with_service_url(&self.service_url)
            .with_eval_file(&self.eval_file)
            .with_output(&self.output)
            .with_n_samples(self.n_samples)
            .with_ks(ks)
            .with_temperature(self.temperature)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_test_timeout(Duration::from_secs(self.test_timeout))
            .with_max_retries(self.max_retries)
            .with_interpreter(&self.interpreter)
            .with_module_filename(&self.module_filename)
            .with_incremental(self.incremental);
        if let Some(path) = &self.summary_output {
            config = config.with_summary_output(path);
        }
        Ok(config)
    }
}

/// Arguments for the exec command.
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Candidate source file.
    #[arg(short = 'c', long)]
    pub code: PathBuf,

    /// Test script that imports the candidate module.
    #[arg(short = 's', long)]
    pub test_script: PathBuf,

    /// Interpreter used to run the test script.
    #[arg(long, env = "PASSK_INTERPRETER", default_value = DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// File name the candidate is written to inside the sandbox.
    #[arg(long, env = "PASSK_MODULE_FILENAME", default_value = DEFAULT_MODULE_FILENAME)]
    pub module_filename: String,

    /// Timeout in seconds for the test script run.
    #[arg(long, env = "PASSK_TEST_TIMEOUT", default_value_t = DEFAULT_TEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Output the result as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Evaluate(args) => {
            run_evaluate_command(args).await?;
        }
        Commands::Exec(args) => {
            run_exec_command(args).await?;
        }
    }
    Ok(())
}

async fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    let driver = EvaluationDriver::from_config(config)?.with_progress(!args.json);

    if !args.json {
        let config = driver.config();
        println!("\npass@k Evaluation");
        println!("=================");
        println!("Service: {}", config.service_url);
        println!("Prompts: {}", config.eval_file.display());
        println!("Samples per prompt: {}", config.n_samples);
        println!("k values: {:?}", config.ks);
        println!();
    }

    let start_time = std::time::Instant::now();
    let outcome = driver.run().await?;
    info!(
        prompts = outcome.report.len(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Evaluation finished"
    );

    if args.json {
        let json_output = serde_json::to_string_pretty(&outcome)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", json_output);
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(50));
    println!("Evaluation Summary");
    println!("{}", "=".repeat(50));
    println!("{}", outcome.summary.render());
    println!("\nResults saved to: {}", args.output.display());
    if let Some(path) = &args.summary_output {
        println!("Summary saved to: {}", path.display());
    }

    Ok(())
}

async fn run_exec_command(args: ExecArgs) -> anyhow::Result<()> {
    let code = fs::read_to_string(&args.code)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.code.display(), e))?;
    if args.timeout == 0 {
        anyhow::bail!("--timeout must be greater than zero");
    }
    if !is_bare_file_name(&args.module_filename) {
        anyhow::bail!(
            "--module-filename must be a bare file name, got '{}'",
            args.module_filename
        );
    }

    let sandbox = Sandbox::new(
        SandboxConfig::new()
            .with_interpreter(&args.interpreter)
            .with_module_filename(&args.module_filename)
            .with_timeout(Duration::from_secs(args.timeout)),
    );
    let result = sandbox.execute(&code, &args.test_script).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let status_icon = if result.passed { "✓" } else { "✗" };
        println!(
            "{} {} (exit code {})",
            status_icon,
            if result.passed { "Passed" } else { "Failed" },
            result.exit_code
        );
        if let Some(ref err) = result.error {
            println!("   ⚠ {}", err);
        }
        if !result.stdout.is_empty() {
            println!("\n--- stdout ---\n{}", result.stdout.trim_end());
        }
        if !result.stderr.is_empty() {
            println!("\n--- stderr ---\n{}", result.stderr.trim_end());
        }
    }

    if !result.passed {
        anyhow::bail!("Test script failed for {}", args.code.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_command_defaults() {
        let cli = Cli::try_parse_from(["passk-eval", "evaluate"]).expect("should parse");

        match cli.command {
            Commands::Evaluate(args) => {
                assert_eq!(args.n_samples, DEFAULT_N_SAMPLES);
                assert_eq!(args.ks, DEFAULT_KS_ARG);
                assert_eq!(args.eval_file, PathBuf::from(DEFAULT_EVAL_FILE));
                assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
                assert!(args.summary_output.is_none());
                assert!(!args.incremental);
                assert!(!args.json);

                let config = args.to_config().unwrap();
                assert_eq!(config.ks, vec![1, 3, 5]);
                assert_eq!(config.test_timeout, Duration::from_secs(10));
            }
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_evaluate_command_with_options() {
        let cli = Cli::try_parse_from([
            "passk-eval",
            "eval",
            "-f",
            "prompts.jsonl",
            "-n",
            "4",
            "-k",
            "4,1",
            "--temperature",
            "0.2",
            "--summary-output",
            "summary.json",
            "--module-filename",
            "solution.py",
            "--incremental",
            "--json",
            "--log-level",
            "debug",
        ])
        .expect("should parse");

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Evaluate(args) => {
                let mut config = args.to_config().unwrap();
                assert_eq!(config.eval_file, PathBuf::from("prompts.jsonl"));
                assert_eq!(config.n_samples, 4);
                assert_eq!(config.temperature, 0.2);
                assert_eq!(config.summary_output, Some(PathBuf::from("summary.json")));
                assert!(config.incremental);
                assert_eq!(config.module_filename, "solution.py");
                assert!(args.json);

                config.validate().unwrap();
                assert_eq!(config.ks, vec![1, 4]);
            }
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_evaluate_rejects_malformed_ks() {
        let cli = Cli::try_parse_from(["passk-eval", "evaluate", "--ks", "1,three"]).unwrap();
        match cli.command {
            Commands::Evaluate(args) => assert!(args.to_config().is_err()),
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_exec_command_requires_paths() {
        assert!(Cli::try_parse_from(["passk-eval", "exec"]).is_err());

        let cli = Cli::try_parse_from([
            "passk-eval",
            "exec",
            "--code",
            "solution.py",
            "--test-script",
            "test_add.py",
        ])
        .unwrap();
        match cli.command {
            Commands::Exec(args) => {
                assert_eq!(args.code, PathBuf::from("solution.py"));
                assert_eq!(args.module_filename, DEFAULT_MODULE_FILENAME);
                assert_eq!(args.timeout, DEFAULT_TEST_TIMEOUT_SECS);
            }
            _ => panic!("Expected Exec command"),
        }
    }

    #[tokio::test]
    async fn test_exec_rejects_module_filename_outside_sandbox() {
        let temp = tempfile::TempDir::new().unwrap();
        let code = temp.path().join("solution.py");
        let script = temp.path().join("test_add.py");
        fs::write(&code, "X = 1\n").unwrap();
        fs::write(&script, "pass\n").unwrap();

        let cli = Cli::try_parse_from([
            "passk-eval",
            "exec",
            "--code",
            code.to_str().unwrap(),
            "--test-script",
            script.to_str().unwrap(),
            "--module-filename",
            "../escaped_solution.py",
        ])
        .unwrap();

        let err = run_with_cli(cli).await.unwrap_err();
        assert!(err.to_string().contains("bare file name"));
        assert!(!temp.path().parent().unwrap().join("escaped_solution.py").exists());
    }
}
