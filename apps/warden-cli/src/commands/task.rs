// task.rs — Task loop subcommands: start, status, check, log, summary,
// complete, cancel, help.

use std::io::BufRead;

use clap::Subcommand;
use warden_loop::{LoopPhase, StartRequest, TaskLoop, TaskLoopState};
use warden_state::ProjectLayout;

/// Line that ends a summary read from stdin.
const SUMMARY_TERMINATOR: &str = "END";

const LOOP_HELP: &str = "\
Task loop protocol:

  1. warden loop start \"<task>\" --promise \"<what done means>\" \\
         --criteria \"<criterion>\" [--criteria ...] [--max-iterations N]
  2. Work. After each step: warden loop log \"<action>\" \"<result>\" [rule]
     Name a rule when you broke one; it lowers the SOP score.
  3. warden loop check <id> for each criterion that now holds.
  4. warden loop summary, then on stdin (end with a line END):
         Rating: <self-rating> (SOP: <score from `warden loop status`>)
         Done: <what was achieved>
         Next: <what comes next; address any violated rules>
  5. warden loop complete (or warden loop cancel to abandon).
";

#[derive(Subcommand)]
pub enum LoopCommands {
    /// Start a new task loop.
    Start {
        /// What the task is.
        task: String,
        /// Advisory iteration budget.
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Acceptance criterion (repeatable).
        #[arg(long = "criteria")]
        criteria: Vec<String>,
        /// What "done" means.
        #[arg(long, default_value = "")]
        promise: String,
        /// Research step to carry out (repeatable).
        #[arg(long = "research")]
        research: Vec<String>,
        /// Question to answer when evaluating the result (repeatable).
        #[arg(long = "eval")]
        eval: Vec<String>,
    },
    /// Show the active loop.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Mark an acceptance criterion as met.
    Check { id: u32 },
    /// Log one step of work.
    Log {
        action: String,
        result: String,
        /// Rule broken in this step, if any.
        rule: Option<String>,
    },
    /// Submit the end-of-task summary on stdin, terminated by a line `END`.
    Summary,
    /// Finish the loop (all criteria checked, summary accepted).
    Complete,
    /// Abandon the loop (summary still required).
    Cancel,
    /// Explain the task loop protocol.
    Help,
}

pub fn execute(cmd: &LoopCommands, layout: &ProjectLayout) -> anyhow::Result<()> {
    let open = || TaskLoop::open(layout);
    match cmd {
        LoopCommands::Help => print!("{}", LOOP_HELP),

        LoopCommands::Start {
            task,
            max_iterations,
            criteria,
            promise,
            research,
            eval,
        } => {
            let state = open()?.start(StartRequest {
                task: task.clone(),
                max_iterations: *max_iterations,
                criteria: criteria.clone(),
                promise: promise.clone(),
                research_steps: research.clone(),
                eval_questions: eval.clone(),
            })?;
            println!("Task loop started: {}", state.task);
            print_state(&state);
        }

        LoopCommands::Status { json } => {
            let tl = open()?;
            match tl.status()? {
                None => println!("No active task loop."),
                Some(state) if *json => println!("{}", serde_json::to_string_pretty(&state)?),
                Some(state) => {
                    print_state(&state);
                    let (score, violated) = tl.current_sop()?;
                    println!();
                    if violated.is_empty() {
                        println!("SOP score: {} (no rules violated)", score);
                    } else {
                        println!("SOP score: {} (violated: {})", score, violated.join(", "));
                    }
                }
            }
        }

        LoopCommands::Check { id } => {
            let state = open()?.check(*id)?;
            let remaining = state.unchecked_criteria().len();
            println!("Criterion {} checked ({} remaining).", id, remaining);
        }

        LoopCommands::Log {
            action,
            result,
            rule,
        } => {
            let outcome = open()?.log(action, result, rule.as_deref())?;
            println!("Logged step {}: {} -> {}", outcome.entry.num, action, result);
            if let Some(rule) = &outcome.entry.rule {
                println!("Recorded violation of '{}'.", rule);
            }
            if outcome.over_budget {
                eprintln!(
                    "[WARNING] task-loop: iteration {} is past the budget; consider stopping to reassess",
                    outcome.iteration
                );
            }
        }

        LoopCommands::Summary => {
            let text = read_summary(std::io::stdin().lock())?;
            let state = open()?.summary(&text)?;
            println!(
                "Summary accepted (SOP: {}). Run `warden loop complete` or `warden loop cancel`.",
                state.sop_score.unwrap_or_default()
            );
        }

        LoopCommands::Complete => {
            let archived = open()?.complete()?;
            println!("Task loop {}. Archived to {}", archived.outcome, archived.path.display());
        }

        LoopCommands::Cancel => {
            let archived = open()?.cancel()?;
            println!("Task loop {}. Archived to {}", archived.outcome, archived.path.display());
        }
    }

    Ok(())
}

fn print_state(state: &TaskLoopState) {
    println!("Task:      {}", state.task);
    println!("Promise:   {}", state.completion_promise);
    println!("Phase:     {}", state.phase());
    println!("Iteration: {}/{}", state.iteration, state.max_iterations);

    if !state.acceptance_criteria.is_empty() {
        println!("Criteria:");
        for c in &state.acceptance_criteria {
            println!("  [{}] {}. {}", if c.checked { "x" } else { " " }, c.id, c.text);
        }
    }
    if !state.research_steps.is_empty() {
        println!("Research:");
        for step in &state.research_steps {
            println!("  - {}", step);
        }
    }
    if !state.eval_questions.is_empty() {
        println!("Evaluate:");
        for q in &state.eval_questions {
            println!("  - {}", q);
        }
    }
    if let Some(last) = state.iteration_log.last() {
        println!("Last step: #{} {} -> {}", last.num, last.action, last.result);
    }
    if state.phase() == LoopPhase::Summarized {
        println!("Summary accepted; ready to complete.");
    }
}

/// Read lines until a line that is exactly `END`, or end of input.
fn read_summary(reader: impl BufRead) -> std::io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim_end() == SUMMARY_TERMINATOR {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
