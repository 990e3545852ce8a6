//! `flowline`: validate, plan and run workflow graphs from JSON files.

mod commands;
mod config;
mod error;

use clap::{Parser, Subcommand};
use commands::{CommandOutput, EXIT_REJECTED, InputSource};
use config::CliConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flowline", version, about = "Workflow DAG execution engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a workflow file is well-formed and acyclic
    Validate {
        /// Path to the workflow JSON file
        file: PathBuf,
    },
    /// Print the execution levels of a workflow
    Plan {
        /// Path to the workflow JSON file
        file: PathBuf,
    },
    /// Execute a workflow and print the execution report
    Run {
        /// Path to the workflow JSON file
        file: PathBuf,
        /// Inline JSON input
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Path to a JSON input file
        #[arg(long)]
        input_file: Option<PathBuf>,
        /// Per-node timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Maximum number of nodes running at once
        #[arg(long)]
        max_concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::from(EXIT_REJECTED);
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Validate { file } => commands::validate(&file),
        Command::Plan { file } => commands::plan(&file),
        Command::Run {
            file,
            input,
            input_file,
            timeout_ms,
            max_concurrency,
        } => {
            let source = match (input, input_file) {
                (Some(text), _) => InputSource::Inline(text),
                (None, Some(path)) => InputSource::File(path),
                (None, None) => InputSource::None,
            };
            let mut executor = config.executor;
            if let Some(ms) = timeout_ms {
                executor.node_timeout_ms = ms;
            }
            if let Some(limit) = max_concurrency {
                executor = executor.with_max_concurrency(limit);
            }
            commands::run(&file, &source, executor).await
        }
    };

    match result {
        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        }) => {
            if !stdout.is_empty() {
                println!("{stdout}");
            }
            if !stderr.is_empty() {
                eprintln!("{stderr}");
            }
            ExitCode::from(exit_code)
        }
        Err(report) => {
            eprintln!("{report}");
            ExitCode::from(EXIT_REJECTED)
        }
    }
}
