//! # warden-audit
//!
//! Append-only logs for the Warden enforcement kernel.
//!
//! - [`ActionLog`] records one [`AuditRecord`] per evaluated action in a JSONL
//!   file. Records are hash-chained (`previous_hash`) so edits to the history
//!   are detectable with [`ActionLog::verify_chain`].
//! - [`RuleLog`] records every rule violation. The task loop's SOP score is
//!   derived from it.
//! - [`ComplianceReport`] summarizes both logs.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use warden_audit::{ActionLog, AuditRecord, CheckResult, EventPhase};
//!
//! let mut log = ActionLog::open("/tmp/actions.jsonl").unwrap();
//! let mut record = AuditRecord::new("Edit", EventPhase::PreTool, CheckResult::Pass)
//!     .with_target("src/main.rs");
//! log.append(&mut record).unwrap();
//! ```

pub mod compliance;
pub mod error;
pub mod hasher;
pub mod log;
pub mod record;
pub mod rules;

pub use compliance::{ComplianceReport, RuleTally, ToolTally};
pub use error::AuditError;
pub use log::ActionLog;
pub use record::{AuditRecord, CheckResult, EventPhase};
pub use rules::{RuleLog, RuleViolation, ViolationSource};
