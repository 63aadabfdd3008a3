// audit.rs — Audit subcommands: tail, verify, range.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use warden_audit::{ActionLog, AuditError, AuditRecord, EventPhase};
use warden_state::ProjectLayout;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Show the most recent records.
    Tail {
        /// Number of records to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
    /// Verify the action log hash chain.
    Verify,
    /// Show records in a time range.
    Range {
        /// Start of the range (RFC 3339, inclusive).
        #[arg(long)]
        since: DateTime<Utc>,
        /// End of the range (RFC 3339, exclusive). Defaults to now.
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
}

pub fn execute(cmd: &AuditCommands, layout: &ProjectLayout) -> anyhow::Result<()> {
    let path = &layout.actions_log;

    match cmd {
        AuditCommands::Verify => {
            if !path.exists() {
                println!("No action log found at {}", path.display());
                return Ok(());
            }
            match ActionLog::verify_chain(path) {
                Ok(count) => println!("Action log verified: {} record(s), hash chain intact.", count),
                Err(AuditError::IntegrityViolation {
                    line,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at line {}:", line);
                    println!("  Expected previous_hash: {}", expected);
                    println!("  Actual previous_hash:   {}", actual);
                    anyhow::bail!("action log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        AuditCommands::Tail { n } => print_records(&ActionLog::recent(path, *n)?),

        AuditCommands::Range { since, until } => {
            print_records(&ActionLog::between(path, *since, *until)?)
        }
    }

    Ok(())
}

fn print_records(records: &[AuditRecord]) {
    if records.is_empty() {
        println!("No action records.");
        return;
    }

    println!(
        "{:<20} {:<5} {:<14} {:<6} TARGET",
        "TIMESTAMP", "PHASE", "TOOL", "RESULT"
    );
    println!("{}", "-".repeat(80));
    for record in records {
        let phase = match record.phase {
            EventPhase::PreTool => "pre",
            EventPhase::PostTool => "post",
        };
        let result = match record.phase {
            EventPhase::PreTool => record.result.to_string(),
            EventPhase::PostTool if record.is_error() => "error".to_string(),
            EventPhase::PostTool => "ok".to_string(),
        };
        println!(
            "{:<20} {:<5} {:<14} {:<6} {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            phase,
            record.tool,
            result,
            record.target.as_deref().unwrap_or("-"),
        );
        if let Some(signature) = &record.error_signature {
            println!("{:<20} {}", "", signature);
        }
    }
}
