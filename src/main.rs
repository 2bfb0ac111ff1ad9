//! pyrunner CLI
//!
//! Runs a Python file through the executor, optionally against an exercise's
//! test script, and prints the result.

use clap::{Parser, Subcommand, ValueEnum};
use pyrunner::{
    DirectoryStore, ExecutionRequest, ExecutionResult, Executor, ExecutorConfig, RunnerConfig,
    TestScriptSource,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error};
use tracing_subscriber::fmt;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "pyrunner")]
#[command(about = "Run Python submissions under time and output limits")]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Exercise directory (overrides config)
    #[arg(long, global = true)]
    exercises_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a source file
    Run {
        /// Python source file
        file: PathBuf,

        /// Exercise whose test script to run
        #[arg(long)]
        exercise: Option<String>,

        /// Run the exercise tests instead of a plain run
        #[arg(long, requires = "exercise")]
        tests: bool,

        /// Runner limits preset
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List exercises that have a test script
    Exercises,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// 3s / 512 KiB
    Fast,
    /// 5s / 1 MiB
    Extended,
}

impl Preset {
    /// Apply the preset's limits, keeping the configured interpreter
    fn apply(self, runner: &mut RunnerConfig) {
        let preset = match self {
            Preset::Fast => RunnerConfig::fast(),
            Preset::Extended => RunnerConfig::extended(),
        };
        runner.timeout_ms = preset.timeout_ms;
        runner.max_output_bytes = preset.max_output_bytes;
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "pyrunner failed");
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = ExecutorConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.exercises_dir {
        config.exercises_dir = dir;
    }

    match args.command {
        Command::Exercises => {
            let store = DirectoryStore::new(&config.exercises_dir);
            for id in store.exercise_ids().await? {
                println!("{}", id);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            file,
            exercise,
            tests,
            preset,
            json,
        } => {
            if let Some(preset) = preset {
                preset.apply(&mut config.runner);
            }
            config.validate()?;

            let source = read_source(&file).await?;
            let request = ExecutionRequest {
                source_text: source,
                exercise_id: exercise,
                run_tests: tests,
            };
            debug!(file = %file.display(), exercise_id = ?request.test_exercise(), "running file");

            let store = Arc::new(DirectoryStore::new(&config.exercises_dir));
            let executor = Executor::new(config, store);
            let result = executor.execute(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

async fn read_source(file: &Path) -> Result<String, Box<dyn std::error::Error>> {
    tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("failed to read {}: {}", file.display(), e).into())
}

fn print_result(result: &ExecutionResult) {
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    if let Some(test_result) = &result.test_result {
        println!();
        for case in &test_result.test_cases {
            let mark = if case.passed { "PASS" } else { "FAIL" };
            match &case.error_message {
                Some(message) => println!("[{}] {}: {}", mark, case.name, message),
                None => println!("[{}] {}", mark, case.name),
            }
        }
        let failed = test_result.failed_cases().count();
        if failed > 0 {
            println!("{} of {} test cases failed", failed, test_result.test_cases.len());
        }
    }
    if let Some(errors) = &result.errors {
        eprintln!("{}", errors);
    }
    println!(
        "\n{} in {}ms",
        if result.success { "success" } else { "failed" },
        result.execution_time_ms
    );
}
