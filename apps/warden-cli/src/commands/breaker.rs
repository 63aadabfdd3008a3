// breaker.rs — Circuit breaker subcommands: status, fail, reset, threshold.

use chrono::Utc;
use clap::Subcommand;
use warden_state::{CircuitBreaker, ProjectLayout, StateStore};

#[derive(Subcommand)]
pub enum BreakerCommands {
    /// Show the breaker state.
    Status,
    /// Record one failed verification.
    Fail {
        /// What failed.
        #[arg(required = true)]
        error: Vec<String>,
    },
    /// Close the breaker and clear the failure count.
    Reset,
    /// Change how many failures trip the breaker.
    Threshold { threshold: u32 },
}

pub fn execute(cmd: &BreakerCommands, layout: &ProjectLayout) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;

    match cmd {
        BreakerCommands::Status => print_breaker(&store.get()),

        BreakerCommands::Fail { error } => {
            let error = error.join(" ");
            let mut tripped_now = false;
            let breaker = store.update::<CircuitBreaker>(|b| {
                tripped_now = b.record_failure(error.as_str(), Utc::now());
            })?;
            if tripped_now {
                tracing::warn!(failures = breaker.failures, "circuit breaker tripped");
                println!(
                    "Circuit breaker TRIPPED after {} failures. All actions are blocked until `warden breaker reset`.",
                    breaker.failures
                );
            } else {
                println!("Failure recorded ({}/{}).", breaker.failures, breaker.threshold);
            }
        }

        BreakerCommands::Reset => {
            store.update::<CircuitBreaker>(|b| b.reset(Utc::now()))?;
            println!("Circuit breaker reset.");
        }

        BreakerCommands::Threshold { threshold } => {
            let breaker = store.update::<CircuitBreaker>(|b| {
                b.set_threshold(*threshold, Utc::now());
            })?;
            println!("Threshold set to {}.", breaker.threshold);
            if breaker.is_tripped() {
                println!("The breaker is tripped ({} failures).", breaker.failures);
            }
        }
    }

    Ok(())
}

fn print_breaker(breaker: &CircuitBreaker) {
    let state = if breaker.is_tripped() { "TRIPPED" } else { "closed" };
    println!("State:     {}", state);
    println!("Failures:  {}/{}", breaker.failures, breaker.threshold);
    if let Some(error) = &breaker.last_error {
        println!("Last error: {}", error);
    }
    if let Some(at) = breaker.tripped_at {
        println!("Tripped:   {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(at) = breaker.reset_at {
        println!("Last reset: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
}
