//! # warden-policy
//!
//! The enforcement core of Warden: hook events in, verdicts out.
//!
//! A hook payload is parsed into a [`HookEvent`] at the boundary. Pre-tool
//! events run through the [`RuleEngine`], an ordered pipeline of [`Check`]s
//! that read and update session state from `warden-state`. Every evaluation
//! is appended to the `warden-audit` action log.
//!
//! ## Key invariants
//!
//! - **Breaker first**: a tripped circuit breaker blocks every action and no
//!   other check runs.
//! - **First block wins**: the pipeline stops at the first blocking finding;
//!   warnings before it are kept.
//! - **Explained denials**: every finding names its rule, the reason, and the
//!   remediation.
//! - **Malformed input allows**: an unparsable payload never blocks the agent.
//! - **Telemetry never blocks**: action-log, rule-log, and pattern-log write
//!   failures are logged and ignored.

pub mod checks;
pub mod config;
pub mod enforcer;
pub mod engine;
pub mod error;
pub mod event;
pub mod gaming;
pub mod intent;
pub mod paths;
pub mod verdict;

pub use config::{GamingConfig, HookConfig, PathConfig, PolicyConfig, SizeLimits};
pub use enforcer::{Enforcer, RECENT_OUTCOMES};
pub use engine::{Check, CheckContext, RuleEngine, SessionState};
pub use error::PolicyError;
pub use event::{HookEvent, ToolClass, ToolInvocation, ToolOutcome};
pub use gaming::{
    check_error_stuffing, check_rapid_research, check_timestamp_gaming, GamingPolicy,
    GAMING_PATTERN,
};
pub use intent::{DetectedIntent, IntentDetector, PatternIntentDetector};
pub use paths::{check_blocked_path, PathGuard};
pub use verdict::{Decision, Finding, Severity, Verdict};
