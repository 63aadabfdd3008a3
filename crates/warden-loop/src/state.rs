// state.rs — TaskLoopState: the persisted task loop.
//
// Lifecycle:
//   Inactive → Active → Summarized → (archived as Completed | Cancelled)
//
// Archiving copies the state to `archive/` and resets the `task_loop` domain
// back to `Inactive`, so there is at most one loop per project at a time.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_state::Domain;

/// Iteration budget when `start` is not given one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Dense, starting at 1.
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

/// One logged step of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationEntry {
    /// Iteration the step was logged in.
    pub num: u32,
    pub action: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
    /// Rule the agent admits to having broken in this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

/// Where a loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    Inactive,
    /// Working; no accepted summary yet.
    Active,
    /// A summary was accepted; the loop can be completed or cancelled.
    Summarized,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopPhase::Inactive => write!(f, "inactive"),
            LoopPhase::Active => write!(f, "active"),
            LoopPhase::Summarized => write!(f, "summarized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLoopState {
    #[serde(default)]
    pub loop_id: Option<Uuid>,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "first_iteration")]
    pub iteration: u32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub task: String,
    /// What "done" means, in the agent's own words.
    #[serde(default)]
    pub completion_promise: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<Criterion>,
    #[serde(default)]
    pub research_steps: Vec<String>,
    #[serde(default)]
    pub eval_questions: Vec<String>,
    #[serde(default)]
    pub iteration_log: Vec<IterationEntry>,
    #[serde(default)]
    pub summary_provided: bool,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(default)]
    pub sop_score: Option<u8>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

fn first_iteration() -> u32 {
    1
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for TaskLoopState {
    fn default() -> Self {
        Self {
            loop_id: None,
            active: false,
            iteration: first_iteration(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            task: String::new(),
            completion_promise: String::new(),
            acceptance_criteria: Vec::new(),
            research_steps: Vec::new(),
            eval_questions: Vec::new(),
            iteration_log: Vec::new(),
            summary_provided: false,
            summary_text: None,
            sop_score: None,
            started_at: None,
        }
    }
}

impl Domain for TaskLoopState {
    const NAME: &'static str = "task_loop";
}

impl TaskLoopState {
    pub fn phase(&self) -> LoopPhase {
        match (self.active, self.summary_provided) {
            (false, _) => LoopPhase::Inactive,
            (true, false) => LoopPhase::Active,
            (true, true) => LoopPhase::Summarized,
        }
    }

    /// Ids of criteria not yet checked, in order.
    pub fn unchecked_criteria(&self) -> Vec<u32> {
        self.acceptance_criteria
            .iter()
            .filter(|c| !c.checked)
            .map(|c| c.id)
            .collect()
    }

    /// The iteration budget is advisory: going over only warns.
    pub fn over_budget(&self) -> bool {
        self.iteration > self.max_iterations
    }

    /// First eight hex digits of the loop id, for archive names.
    pub fn short_id(&self) -> String {
        self.loop_id
            .map(|id| id.simple().to_string()[..8].to_string())
            .unwrap_or_else(|| "00000000".to_string())
    }
}

/// How a loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopOutcome {
    Completed,
    Cancelled,
}

impl fmt::Display for LoopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopOutcome::Completed => write!(f, "completed"),
            LoopOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// An archived loop: the final state plus how and when it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedLoop {
    pub outcome: LoopOutcome,
    pub archived_at: DateTime<Utc>,
    pub state: TaskLoopState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inactive_at_first_iteration() {
        let state = TaskLoopState::default();
        assert_eq!(state.phase(), LoopPhase::Inactive);
        assert_eq!(state.iteration, 1);
        assert_eq!(state.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let state: TaskLoopState = serde_json::from_str(r#"{"active": true, "task": "t"}"#).unwrap();
        assert_eq!(state.phase(), LoopPhase::Active);
        assert_eq!(state.iteration, 1);
        assert_eq!(state.max_iterations, 10);
    }

    #[test]
    fn short_id_is_eight_hex_digits() {
        let state = TaskLoopState {
            loop_id: Some(Uuid::new_v4()),
            ..TaskLoopState::default()
        };
        let id = state.short_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
