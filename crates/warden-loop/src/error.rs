// error.rs — Error types for the task loop.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during task-loop operations.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("a task loop is already active: {task}")]
    AlreadyActive { task: String },

    #[error("no active task loop (start one with `warden loop start`)")]
    NotActive,

    #[error("task description must not be empty")]
    EmptyTask,

    #[error("a completion promise is required (--promise)")]
    EmptyPromise,

    #[error("max iterations must be at least 1, got {0}")]
    InvalidMaxIterations(u32),

    #[error("no acceptance criterion with id {0}")]
    UnknownCriterion(u32),

    #[error("acceptance criteria not yet checked: {}", join_ids(.0))]
    CriteriaUnchecked(Vec<u32>),

    #[error("no summary provided yet (run `warden loop summary`)")]
    SummaryMissing,

    #[error(
        "summary is stale: it reported SOP {recorded} but the score is now {current} \
         (run `warden loop summary` again)"
    )]
    SummaryStale { recorded: u8, current: u8 },

    #[error("summary rejected: {}", .reasons.join("; "))]
    SummaryRejected { reasons: Vec<String> },

    #[error("failed to archive task loop to {path}: {source}")]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] warden_state::StoreError),

    #[error(transparent)]
    Audit(#[from] warden_audit::AuditError),
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
