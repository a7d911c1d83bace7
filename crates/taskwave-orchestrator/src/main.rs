//! taskwave - run a wave of Claude Code tasks under a concurrency cap.
//!
//! Progress lines and the results block go to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use taskwave_core::WaveSummary;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskwave_orchestrator::report::{
    render_banner, render_dry_run, render_results_block, render_summary,
};
use taskwave_orchestrator::{
    load_wave_config, ClaudeTaskExecutor, ConsoleProgress, ProgressFormat, WaveCoordinator,
    WorkerProfile,
};

/// Resolve a batch of issues with parallel Claude Code sessions
#[derive(Parser)]
#[command(name = "taskwave")]
#[command(about = "Run a wave of Claude Code tasks with bounded concurrency", long_about = None)]
struct Cli {
    /// Batch descriptor JSON file (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Print the batch and exit without running anything
    #[arg(long)]
    dry_run: bool,

    /// Override the batch's concurrency cap
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Path to the Claude CLI binary
    #[arg(long, default_value = "claude")]
    claude_path: String,

    /// Model to run every task with
    #[arg(long)]
    model: Option<String>,

    /// Turn cap per task
    #[arg(long)]
    max_turns: Option<u32>,

    /// Emit progress as JSON lines
    #[arg(long)]
    json_progress: bool,

    /// Log level for stderr output when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "taskwave={level},taskwave_orchestrator={level},taskwave_claude_sdk={level}"
        ))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let mut config = load_wave_config(cli.file.as_deref())?;
    if let Some(max_concurrent) = cli.max_concurrent {
        config = config.with_max_concurrent(max_concurrent);
        config.validate()?;
    }

    if cli.dry_run {
        println!("{}", render_dry_run(&config.issues, config.max_concurrent));
        return Ok(ExitCode::SUCCESS);
    }

    let mut profile = WorkerProfile::default();
    if let Some(max_turns) = cli.max_turns {
        profile.max_turns = max_turns;
    }
    profile.model = cli.model;

    let format = if cli.json_progress {
        ProgressFormat::Json
    } else {
        ProgressFormat::Text
    };

    info!(
        tasks = config.issues.len(),
        max_concurrent = config.max_concurrent,
        claude_path = %cli.claude_path,
        "Starting taskwave"
    );
    println!("{}", render_banner(&config.issues, config.max_concurrent));

    let coordinator = WaveCoordinator::new(
        Arc::new(ClaudeTaskExecutor::new(cli.claude_path)),
        profile,
        Arc::new(ConsoleProgress::new(format)),
    );
    let results = coordinator.run(&config).await?;

    println!("{}", render_summary(&results));
    println!("{}", render_results_block(&results)?);

    if WaveSummary::from_results(&results).all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
