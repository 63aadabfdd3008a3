// gaming.rs — Heuristics for satisfying process requirements without doing the work.
//
// Three independent detectors each return an optional finding:
//
// - rapid research: every category marked complete within a few seconds,
// - identical timestamps: several categories stamped at the same instant,
// - error stuffing: a run of failures capped by a delegated task that
//   suddenly "succeeds".
//
// A single odd signal only warns. Repeated detections across the session, or
// several signals in one evaluation, block.

use chrono::{DateTime, Duration, Utc};
use warden_audit::{AuditRecord, EventPhase};
use warden_state::{PatternLog, ResearchCategory, ResearchStatus};

use crate::config::GamingConfig;
use crate::verdict::Finding;

/// Pattern-log counter for gaming detections.
pub const GAMING_PATTERN: &str = "gaming";

pub const RULE: &str = "gaming";

/// At least this many categories must share an instant to count.
const IDENTICAL_TIMESTAMP_MIN: usize = 3;

/// Outcomes considered by the error-stuffing detector.
const ERROR_WINDOW: usize = 10;

/// Shorter histories are not judged.
const MIN_ERROR_WINDOW: usize = 5;

/// Tool whose success after a failure streak is suspicious.
const DELEGATE_TOOL: &str = "Task";

/// All categories marked complete within `window` of each other.
pub fn check_rapid_research(research: &ResearchStatus, window: Duration) -> Option<String> {
    if research.completed_count() < ResearchCategory::ALL.len() {
        return None;
    }
    let stamps = research.timestamps();
    let first = stamps.iter().min()?;
    let last = stamps.iter().max()?;
    let span = *last - *first;
    if span < window {
        Some(format!(
            "all {} research categories were marked complete within {}s",
            stamps.len(),
            span.num_seconds()
        ))
    } else {
        None
    }
}

/// Three or more categories carrying the exact same completion timestamp.
pub fn check_timestamp_gaming(research: &ResearchStatus) -> Option<String> {
    let stamps = research.timestamps();
    let (stamp, count) = stamps
        .iter()
        .map(|ts| (ts, stamps.iter().filter(|other| *other == ts).count()))
        .max_by_key(|(_, count)| *count)?;
    if count >= IDENTICAL_TIMESTAMP_MIN {
        Some(format!(
            "{} research categories share the identical timestamp {}",
            count,
            stamp.to_rfc3339()
        ))
    } else {
        None
    }
}

/// A high error rate over the recent outcomes, capped by a successful
/// delegated task.
///
/// Outcomes are post-tool records plus blocked pre-tool records (a blocked
/// action never produces a post-tool record). Passing pre-tool records are
/// skipped: their outcome arrives later.
pub fn check_error_stuffing(records: &[AuditRecord], ratio: f64) -> Option<String> {
    let outcomes: Vec<&AuditRecord> = records.iter().filter(|r| r.is_outcome()).collect();
    let window = &outcomes[outcomes.len().saturating_sub(ERROR_WINDOW)..];
    if window.len() < MIN_ERROR_WINDOW {
        return None;
    }

    let last = window.last()?;
    if last.tool != DELEGATE_TOOL || last.phase != EventPhase::PostTool || last.is_error() {
        return None;
    }

    let errors = window.iter().filter(|r| r.is_error()).count();
    let observed = errors as f64 / window.len() as f64;
    if observed >= ratio {
        Some(format!(
            "{} of the last {} outcomes were errors, then a delegated task reported success",
            errors,
            window.len()
        ))
    } else {
        None
    }
}

/// The configured detectors plus the escalation rule.
#[derive(Debug, Clone, Copy)]
pub struct GamingPolicy {
    rapid_window: Duration,
    error_ratio: f64,
    escalation_count: u32,
}

impl Default for GamingPolicy {
    fn default() -> Self {
        Self::new(&GamingConfig::default())
    }
}

impl GamingPolicy {
    pub fn new(config: &GamingConfig) -> Self {
        Self {
            rapid_window: Duration::seconds(config.rapid_window_secs),
            error_ratio: config.error_ratio,
            escalation_count: config.escalation_count.max(1),
        }
    }

    /// Run every detector and collect what they found.
    pub fn detect(&self, research: &ResearchStatus, recent: &[AuditRecord]) -> Vec<String> {
        [
            check_rapid_research(research, self.rapid_window),
            check_timestamp_gaming(research),
            check_error_stuffing(recent, self.error_ratio),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Record one detection in the pattern log and grade it.
    ///
    /// Blocks when the session's cumulative count (including this one)
    /// reaches the escalation count, or when this evaluation alone produced
    /// two or more findings. Otherwise warns.
    pub fn escalate(
        &self,
        findings: &[String],
        log: &mut PatternLog,
        now: DateTime<Utc>,
    ) -> Option<Finding> {
        if findings.is_empty() {
            return None;
        }
        let reason = findings.join("; ");
        let count = log.record(GAMING_PATTERN, reason.clone(), now);
        tracing::info!(count, findings = findings.len(), "gaming pattern detected");

        if count >= self.escalation_count || findings.len() >= 2 {
            Some(Finding::block(
                RULE,
                format!("{} (detection #{} this session)", reason, count),
                "Do the research and verification for real: read the code, run the \
                 checks, and mark categories as each one is actually finished.",
            ))
        } else {
            Some(Finding::warn(
                RULE,
                format!("{} (detection #{} this session)", reason, count),
                "Repeated detections will block further edits.",
            ))
        }
    }
}
