//! # warden-loop
//!
//! The structured task loop: a single active task with acceptance criteria,
//! an advisory iteration budget, and a mandatory end-of-task summary scored
//! against the rules violated while the loop ran.
//!
//! ## Key invariants
//!
//! - **One loop per project**: `start` fails while a loop is active.
//! - **No silent exit**: both `complete` and `cancel` require an accepted
//!   summary; `complete` also requires every criterion checked.
//! - **Honest scoring**: the summary must quote the computed SOP score, and
//!   must address any violated rules in its `Next:` line.
//! - **Clean slate**: a finished loop is archived, and the loop, requirements,
//!   research status, and edit attempts are reset.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use warden_loop::{StartRequest, TaskLoop};
//! use warden_state::ProjectLayout;
//!
//! let tl = TaskLoop::open(&ProjectLayout::for_project(".")).unwrap();
//! tl.start(StartRequest {
//!     task: "Fix login bug".into(),
//!     criteria: vec!["Tests pass".into()],
//!     promise: "Users can log in".into(),
//!     ..StartRequest::default()
//! })
//! .unwrap();
//! ```

pub mod error;
pub mod sop;
pub mod state;
pub mod summary;
pub mod task_loop;

pub use error::LoopError;
pub use sop::sop_score;
pub use state::{
    ArchivedLoop, Criterion, IterationEntry, LoopOutcome, LoopPhase, TaskLoopState,
    DEFAULT_MAX_ITERATIONS,
};
pub use summary::validate_summary;
pub use task_loop::{Archived, LogOutcome, StartRequest, TaskLoop};
