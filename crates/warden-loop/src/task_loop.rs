// task_loop.rs — TaskLoop: operations on the persisted task loop.
//
// Every operation loads the `task_loop` domain, validates, and writes it back
// before returning. A failed operation leaves the stored state untouched.
//
// The SOP score accepted with the summary must still hold when the loop ends;
// a violation logged after the summary makes it stale.
//
// Terminal transitions (`complete`, `cancel`) archive the loop to
// `archive/task-loop-<UTC timestamp>-<id8>.json`, then reset the loop and the
// state that belonged to the task: requirements, research status, and edit
// attempts. The next task starts clean.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use warden_audit::{RuleLog, RuleViolation, ViolationSource};
use warden_state::{EditAttemptCounter, ProjectLayout, RequirementSet, ResearchStatus, StateStore};

use crate::error::LoopError;
use crate::sop::sop_score;
use crate::state::{
    ArchivedLoop, Criterion, IterationEntry, LoopOutcome, TaskLoopState, DEFAULT_MAX_ITERATIONS,
};
use crate::summary::validate_summary;

/// Arguments to `start`.
#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub task: String,
    pub max_iterations: Option<u32>,
    pub criteria: Vec<String>,
    pub promise: String,
    pub research_steps: Vec<String>,
    pub eval_questions: Vec<String>,
}

/// Result of logging a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOutcome {
    pub entry: IterationEntry,
    /// Iteration after the step.
    pub iteration: u32,
    /// The advisory iteration budget has been exceeded.
    pub over_budget: bool,
}

/// Result of a terminal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archived {
    pub outcome: LoopOutcome,
    pub path: PathBuf,
}

pub struct TaskLoop {
    store: StateStore,
    rule_log: RuleLog,
    archive_dir: PathBuf,
}

impl TaskLoop {
    pub fn new(store: StateStore, rule_log: RuleLog, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            rule_log,
            archive_dir: archive_dir.into(),
        }
    }

    /// Task loop over a project's `.warden/` directory.
    pub fn open(layout: &ProjectLayout) -> Result<Self, LoopError> {
        Ok(Self::new(
            StateStore::open(&layout.state_dir)?,
            RuleLog::new(&layout.rules_log),
            layout.archive_dir.clone(),
        ))
    }

    fn active(&self) -> Result<TaskLoopState, LoopError> {
        let state: TaskLoopState = self.store.try_get()?;
        if state.active {
            Ok(state)
        } else {
            Err(LoopError::NotActive)
        }
    }

    pub fn start(&self, request: StartRequest) -> Result<TaskLoopState, LoopError> {
        let current: TaskLoopState = self.store.try_get()?;
        if current.active {
            return Err(LoopError::AlreadyActive { task: current.task });
        }
        let task = request.task.trim();
        if task.is_empty() {
            return Err(LoopError::EmptyTask);
        }
        let promise = request.promise.trim();
        if promise.is_empty() {
            return Err(LoopError::EmptyPromise);
        }
        let max_iterations = request.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
        if max_iterations == 0 {
            return Err(LoopError::InvalidMaxIterations(max_iterations));
        }

        let state = TaskLoopState {
            loop_id: Some(Uuid::new_v4()),
            active: true,
            iteration: 1,
            max_iterations,
            task: task.to_string(),
            completion_promise: promise.to_string(),
            acceptance_criteria: request
                .criteria
                .into_iter()
                .zip(1..)
                .map(|(text, id)| Criterion {
                    id,
                    text,
                    checked: false,
                })
                .collect(),
            research_steps: request.research_steps,
            eval_questions: request.eval_questions,
            started_at: Some(Utc::now()),
            ..TaskLoopState::default()
        };
        self.store.put(&state)?;
        tracing::info!(task = %state.task, max_iterations, "task loop started");
        Ok(state)
    }

    /// The active loop, or `None` when no loop is running.
    pub fn status(&self) -> Result<Option<TaskLoopState>, LoopError> {
        match self.active() {
            Ok(state) => Ok(Some(state)),
            Err(LoopError::NotActive) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Mark a criterion checked. Checking it again is a no-op.
    pub fn check(&self, id: u32) -> Result<TaskLoopState, LoopError> {
        let mut state = self.active()?;
        let criterion = state
            .acceptance_criteria
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(LoopError::UnknownCriterion(id))?;
        if !criterion.checked {
            criterion.checked = true;
            self.store.put(&state)?;
            tracing::info!(id, "acceptance criterion checked");
        }
        Ok(state)
    }

    /// Log one step. A named rule is also recorded as a self-reported
    /// violation, which lowers the SOP score.
    ///
    /// The step is persisted before the violation is appended, so a step that
    /// fails to save never leaves a violation behind.
    pub fn log(&self, action: &str, result: &str, rule: Option<&str>) -> Result<LogOutcome, LoopError> {
        let mut state = self.active()?;
        let now = Utc::now();
        let rule = rule.map(str::trim).filter(|r| !r.is_empty());

        let entry = IterationEntry {
            num: state.iteration,
            action: action.to_string(),
            result: result.to_string(),
            timestamp: now,
            rule: rule.map(str::to_string),
        };
        state.iteration_log.push(entry.clone());
        state.iteration += 1;
        self.store.put(&state)?;

        if let Some(rule) = rule {
            let violation = RuleViolation::new(
                rule,
                format!("{}: {}", action, result),
                ViolationSource::SelfReported,
            )
            .with_timestamp(now);
            self.rule_log.append(&violation)?;
        }

        let over_budget = state.over_budget();
        if over_budget {
            tracing::warn!(
                iteration = state.iteration,
                max_iterations = state.max_iterations,
                "task loop is over its iteration budget"
            );
        }
        Ok(LogOutcome {
            entry,
            iteration: state.iteration,
            over_budget,
        })
    }

    /// Rules violated since the loop started, and the score they imply.
    pub fn current_sop(&self) -> Result<(u8, Vec<String>), LoopError> {
        let state = self.active()?;
        let violated = self.violations_since_start(&state)?;
        Ok((sop_score(violated.len()), violated.into_iter().collect()))
    }

    fn violations_since_start(&self, state: &TaskLoopState) -> Result<BTreeSet<String>, LoopError> {
        let since = state.started_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.rule_log.unique_rules_since(since)?)
    }

    /// Validate and record the end-of-task summary.
    pub fn summary(&self, text: &str) -> Result<TaskLoopState, LoopError> {
        let mut state = self.active()?;
        let violated = self.violations_since_start(&state)?;
        let score = sop_score(violated.len());

        validate_summary(text, score, &violated)
            .map_err(|reasons| LoopError::SummaryRejected { reasons })?;

        state.summary_provided = true;
        state.summary_text = Some(text.trim().to_string());
        state.sop_score = Some(score);
        self.store.put(&state)?;
        tracing::info!(sop_score = score, "task loop summary accepted");
        Ok(state)
    }

    /// Finish the loop. Every criterion must be checked and a current
    /// summary given.
    pub fn complete(&self) -> Result<Archived, LoopError> {
        let state = self.active()?;
        let unchecked = state.unchecked_criteria();
        if !unchecked.is_empty() {
            return Err(LoopError::CriteriaUnchecked(unchecked));
        }
        self.require_current_summary(&state)?;
        self.archive(state, LoopOutcome::Completed)
    }

    /// Abandon the loop. A current summary is still required.
    pub fn cancel(&self) -> Result<Archived, LoopError> {
        let state = self.active()?;
        self.require_current_summary(&state)?;
        self.archive(state, LoopOutcome::Cancelled)
    }

    /// The accepted summary's SOP score must match the rule log as it is now.
    fn require_current_summary(&self, state: &TaskLoopState) -> Result<(), LoopError> {
        let recorded = match (state.summary_provided, state.sop_score) {
            (true, Some(score)) => score,
            _ => return Err(LoopError::SummaryMissing),
        };
        let current = sop_score(self.violations_since_start(state)?.len());
        if recorded != current {
            tracing::warn!(recorded, current, "summary SOP score is stale");
            return Err(LoopError::SummaryStale { recorded, current });
        }
        Ok(())
    }

    fn archive(&self, state: TaskLoopState, outcome: LoopOutcome) -> Result<Archived, LoopError> {
        let archived_at = Utc::now();
        let path = self.archive_dir.join(format!(
            "task-loop-{}-{}.json",
            archived_at.format("%Y%m%dT%H%M%SZ"),
            state.short_id()
        ));
        std::fs::create_dir_all(&self.archive_dir).map_err(|source| LoopError::Archive {
            path: self.archive_dir.clone(),
            source,
        })?;
        let record = ArchivedLoop {
            outcome,
            archived_at,
            state,
        };
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, json).map_err(|source| LoopError::Archive {
            path: path.clone(),
            source,
        })?;

        self.store.reset::<TaskLoopState>()?;
        self.store.reset::<RequirementSet>()?;
        self.store.reset::<ResearchStatus>()?;
        self.store.reset::<EditAttemptCounter>()?;
        tracing::info!(%outcome, path = %path.display(), "task loop archived");
        Ok(Archived { outcome, path })
    }
}
