// compliance.rs — Compliance summary over the action and rule logs.
//
// Answers "how is this session going?": how many actions were evaluated, how
// many were blocked or warned about, which tools drew the most findings, and
// which rules were broken most often.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{AuditRecord, CheckResult, EventPhase};
use crate::rules::RuleViolation;

/// Verdict counts for one tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolTally {
    pub pass: usize,
    pub warn: usize,
    pub block: usize,
}

impl ToolTally {
    pub fn total(&self) -> usize {
        self.pass + self.warn + self.block
    }
}

/// How often one rule was violated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleTally {
    pub rule: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    pub computed_at: DateTime<Utc>,
    /// Start of the reporting window (`None` = whole history).
    pub since: Option<DateTime<Utc>>,
    /// Pre-tool evaluations in the window.
    pub evaluated: usize,
    pub passed: usize,
    pub warned: usize,
    pub blocked: usize,
    /// Post-tool results the host reported as failed.
    pub failed_results: usize,
    /// `blocked / evaluated`, or 0.0 when nothing was evaluated.
    pub block_rate: f64,
    pub per_tool: BTreeMap<String, ToolTally>,
    /// Violated rules, most frequent first (ties by name).
    pub top_rules: Vec<RuleTally>,
}

impl ComplianceReport {
    pub fn build(
        actions: &[AuditRecord],
        violations: &[RuleViolation],
        since: Option<DateTime<Utc>>,
    ) -> Self {
        let in_window = |ts: &DateTime<Utc>| since.map_or(true, |s| *ts >= s);

        let mut per_tool: BTreeMap<String, ToolTally> = BTreeMap::new();
        let mut failed_results = 0;
        for record in actions.iter().filter(|r| in_window(&r.timestamp)) {
            match record.phase {
                EventPhase::PreTool => {
                    let tally = per_tool.entry(record.tool.clone()).or_default();
                    match record.result {
                        CheckResult::Pass => tally.pass += 1,
                        CheckResult::Warn => tally.warn += 1,
                        CheckResult::Block => tally.block += 1,
                    }
                }
                EventPhase::PostTool => {
                    if record.is_error() {
                        failed_results += 1;
                    }
                }
            }
        }

        let passed = per_tool.values().map(|t| t.pass).sum();
        let warned = per_tool.values().map(|t| t.warn).sum();
        let blocked: usize = per_tool.values().map(|t| t.block).sum();
        let evaluated: usize = per_tool.values().map(ToolTally::total).sum();
        let block_rate = if evaluated == 0 {
            0.0
        } else {
            blocked as f64 / evaluated as f64
        };

        let mut rule_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for violation in violations.iter().filter(|v| in_window(&v.timestamp)) {
            *rule_counts.entry(violation.rule.as_str()).or_insert(0) += 1;
        }
        let mut top_rules: Vec<RuleTally> = rule_counts
            .into_iter()
            .map(|(rule, count)| RuleTally {
                rule: rule.to_string(),
                count,
            })
            .collect();
        // BTreeMap iteration is already name-ordered; a stable sort keeps ties that way.
        top_rules.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            computed_at: Utc::now(),
            since,
            evaluated,
            passed,
            warned,
            blocked,
            failed_results,
            block_rate,
            per_tool,
            top_rules,
        }
    }

    /// Number of distinct rules violated in the window.
    pub fn distinct_rules(&self) -> usize {
        self.top_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ViolationSource;
    use chrono::Duration;

    fn pre(tool: &str, result: CheckResult) -> AuditRecord {
        AuditRecord::new(tool, EventPhase::PreTool, result)
    }

    #[test]
    fn counts_results_and_rules() {
        let actions = vec![
            pre("Edit", CheckResult::Pass),
            pre("Edit", CheckResult::Block),
            pre("Bash", CheckResult::Warn),
            pre("Bash", CheckResult::Block),
            AuditRecord::new("Bash", EventPhase::PostTool, CheckResult::Pass).with_success(false),
        ];
        let violations = vec![
            RuleViolation::new("file-size", "x", ViolationSource::Engine),
            RuleViolation::new("dangerous-command", "y", ViolationSource::Engine),
            RuleViolation::new("file-size", "z", ViolationSource::Engine),
        ];

        let report = ComplianceReport::build(&actions, &violations, None);
        assert_eq!(report.evaluated, 4);
        assert_eq!(report.blocked, 2);
        assert_eq!(report.warned, 1);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed_results, 1);
        assert!((report.block_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.per_tool["Edit"].total(), 2);
        assert_eq!(report.top_rules[0].rule, "file-size");
        assert_eq!(report.top_rules[0].count, 2);
        assert_eq!(report.distinct_rules(), 2);
    }

    #[test]
    fn window_excludes_older_entries() {
        let old = Utc::now() - Duration::days(1);
        let actions = vec![
            pre("Edit", CheckResult::Block).with_timestamp(old),
            pre("Edit", CheckResult::Pass),
        ];
        let violations =
            vec![RuleViolation::new("file-size", "x", ViolationSource::Engine).with_timestamp(old)];

        let report =
            ComplianceReport::build(&actions, &violations, Some(Utc::now() - Duration::hours(1)));
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.blocked, 0);
        assert!(report.top_rules.is_empty());
    }

    #[test]
    fn empty_history_has_zero_block_rate() {
        let report = ComplianceReport::build(&[], &[], None);
        assert_eq!(report.evaluated, 0);
        assert_eq!(report.block_rate, 0.0);
    }
}
