//! # warden
//!
//! Command-line entry point for the Warden enforcement kernel.
//!
//! - `warden hook` — evaluate one hook event from stdin (exit code is the verdict)
//! - `warden loop start/status/check/log/summary/complete/cancel` — the task loop
//! - `warden research/breaker/halt/resume` — explicit state changes
//! - `warden requirements/patterns` — inspect session state
//! - `warden audit tail/verify/range`, `warden report` — inspect the logs

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warden_state::ProjectLayout;

/// Environment variable holding the log filter (e.g. `WARDEN_LOG=debug`).
const LOG_ENV: &str = "WARDEN_LOG";

/// Warden: process guardrails for autonomous coding agents.
#[derive(Parser)]
#[command(name = "warden", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one hook event read from stdin.
    Hook,
    /// Drive the structured task loop.
    #[command(disable_help_subcommand = true)]
    Loop {
        #[command(subcommand)]
        command: commands::task::LoopCommands,
    },
    /// Record and inspect research progress.
    Research {
        #[command(subcommand)]
        command: commands::research::ResearchCommands,
    },
    /// Inspect and control the circuit breaker.
    Breaker {
        #[command(subcommand)]
        command: commands::breaker::BreakerCommands,
    },
    /// Pause all mutating tools until `warden resume`.
    Halt {
        /// Why enforcement is halted (shown to the agent).
        #[arg(required = true)]
        reason: Vec<String>,
    },
    /// Lift a halt.
    Resume,
    /// Show the current requirement set.
    Requirements {
        #[arg(long)]
        json: bool,
    },
    /// Show gaming and other pattern detections.
    Patterns {
        #[arg(long)]
        json: bool,
    },
    /// Inspect the action log.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
    /// Summarize compliance from the action and rule logs.
    Report {
        /// Only count records at or after this RFC 3339 timestamp.
        #[arg(long)]
        since: Option<chrono::DateTime<chrono::Utc>>,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    // stdout carries command output; diagnostics go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let layout = ProjectLayout::for_project(&project_root);

    match &cli.command {
        Commands::Hook => commands::hook::execute(&layout),
        Commands::Loop { command } => commands::task::execute(command, &layout),
        Commands::Research { command } => commands::research::execute(command, &layout),
        Commands::Breaker { command } => commands::breaker::execute(command, &layout),
        Commands::Halt { reason } => commands::halt::halt(&layout, &reason.join(" ")),
        Commands::Resume => commands::halt::resume(&layout),
        Commands::Requirements { json } => commands::state::requirements(&layout, *json),
        Commands::Patterns { json } => commands::state::patterns(&layout, *json),
        Commands::Audit { command } => commands::audit::execute(command, &layout),
        Commands::Report { since, json } => commands::report::execute(&layout, *since, *json),
    }
}
