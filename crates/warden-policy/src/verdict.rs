// verdict.rs — Findings and the overall verdict of an evaluation.

use serde::Serialize;
use warden_audit::CheckResult;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Surfaced to the agent; the action proceeds.
    Warn,
    /// The action is aborted.
    Block,
}

/// One check's objection to an action.
///
/// Every finding names the rule, says what is wrong, and says how to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub remediation: String,
}

impl Finding {
    pub fn block(
        rule: impl Into<String>,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity: Severity::Block,
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn warn(
        rule: impl Into<String>,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity: Severity::Warn,
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    pub fn is_block(&self) -> bool {
        self.severity == Severity::Block
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warn => "WARNING",
            Severity::Block => "BLOCKED",
        };
        write!(f, "[{}] {}: {}", label, self.rule, self.message)?;
        if !self.remediation.is_empty() {
            write!(f, "\n  fix: {}", self.remediation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Warn,
    Block,
}

impl From<Decision> for CheckResult {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allow => CheckResult::Pass,
            Decision::Warn => CheckResult::Warn,
            Decision::Block => CheckResult::Block,
        }
    }
}

/// Result of evaluating one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub decision: Decision,
    /// Warnings in pipeline order, then the blocking finding (if any) last.
    pub findings: Vec<Finding>,
    /// Checks that ran, in pipeline order.
    pub checks_run: Vec<&'static str>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            findings: Vec::new(),
            checks_run: Vec::new(),
        }
    }

    /// Fold findings into a decision: any block blocks, any warning warns.
    pub fn from_findings(findings: Vec<Finding>, checks_run: Vec<&'static str>) -> Self {
        let decision = if findings.iter().any(Finding::is_block) {
            Decision::Block
        } else if findings.is_empty() {
            Decision::Allow
        } else {
            Decision::Warn
        };
        Self {
            decision,
            findings,
            checks_run,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.decision == Decision::Block
    }

    /// The blocking finding, if the action was blocked.
    pub fn blocking(&self) -> Option<&Finding> {
        self.findings.iter().find(|f| f.is_block())
    }

    /// Process exit code for the host: 0 lets the action proceed.
    pub fn exit_code(&self, block_code: i32) -> i32 {
        if self.is_blocked() {
            block_code
        } else {
            0
        }
    }

    /// Diagnostic lines for the out-of-band channel, one per finding.
    pub fn render(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_follows_worst_finding() {
        assert_eq!(Verdict::from_findings(vec![], vec![]).decision, Decision::Allow);

        let warned = Verdict::from_findings(vec![Finding::warn("file-size", "big", "split")], vec![]);
        assert_eq!(warned.decision, Decision::Warn);
        assert_eq!(warned.exit_code(1), 0);

        let blocked = Verdict::from_findings(
            vec![
                Finding::warn("file-size", "big", "split"),
                Finding::block("blocked-path", "denied", "use another path"),
            ],
            vec!["circuit-breaker", "blocked-path"],
        );
        assert!(blocked.is_blocked());
        assert_eq!(blocked.exit_code(2), 2);
        assert_eq!(blocked.blocking().map(|f| f.rule.as_str()), Some("blocked-path"));
    }

    #[test]
    fn rendered_finding_names_rule_and_fix() {
        let line = Finding::block("lazy-commit", "message too short", "describe the change")
            .to_string();
        assert!(line.starts_with("[BLOCKED] lazy-commit: message too short"));
        assert!(line.contains("fix: describe the change"));
    }

    #[test]
    fn decision_maps_to_audit_result() {
        assert_eq!(CheckResult::from(Decision::Warn), CheckResult::Warn);
        assert_eq!(CheckResult::from(Decision::Block), CheckResult::Block);
    }
}
