// record.rs — AuditRecord: one line in the action log.
//
// A record is written for every tool invocation the kernel evaluates
// (`pre_tool`) and for every tool result the host reports back (`post_tool`).
// Pre-tool records carry the verdict; post-tool records carry the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall result of evaluating an action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Pass,
    Warn,
    Block,
}

impl std::fmt::Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckResult::Pass => write!(f, "pass"),
            CheckResult::Warn => write!(f, "warn"),
            CheckResult::Block => write!(f, "block"),
        }
    }
}

/// Which side of the tool call the record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// Evaluated before the tool ran.
    PreTool,
    /// Reported by the host after the tool ran.
    PostTool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Name of the tool the agent invoked (e.g. "Edit", "Bash", "Task").
    pub tool: String,
    pub phase: EventPhase,
    /// Checks that ran, in pipeline order.
    #[serde(default)]
    pub rules_checked: Vec<String>,
    pub result: CheckResult,
    /// Short signature of the error the tool produced, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_signature: Option<String>,
    /// Whether the tool succeeded (post-tool records only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// File path or command the action targeted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Hash of the previous line in the log. `None` for the first record.
    pub previous_hash: Option<String>,
}

impl AuditRecord {
    pub fn new(tool: impl Into<String>, phase: EventPhase, result: CheckResult) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            tool: tool.into(),
            phase,
            rules_checked: Vec::new(),
            result,
            error_signature: None,
            success: None,
            target: None,
            previous_hash: None,
        }
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rules_checked = rules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_error_signature(mut self, signature: impl Into<String>) -> Self {
        self.error_signature = Some(signature.into());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// A record is an outcome if it reports how an action ended: a post-tool
    /// result, or a pre-tool block (a blocked action has no post-tool record).
    pub fn is_outcome(&self) -> bool {
        self.phase == EventPhase::PostTool || self.result == CheckResult::Block
    }

    /// A record counts as an error if it was blocked, failed, or carries an
    /// error signature.
    pub fn is_error(&self) -> bool {
        self.result == CheckResult::Block
            || self.success == Some(false)
            || self.error_signature.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        let record = AuditRecord::new("Read", EventPhase::PreTool, CheckResult::Pass);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("error_signature"));
        assert!(!json.contains("success"));
        assert!(json.contains("\"pre_tool\""));
    }

    #[test]
    fn error_classification() {
        let pass = AuditRecord::new("Bash", EventPhase::PostTool, CheckResult::Pass);
        assert!(!pass.is_error());
        assert!(pass.clone().with_success(false).is_error());
        assert!(pass.clone().with_error_signature("exit 1").is_error());
        assert!(AuditRecord::new("Edit", EventPhase::PreTool, CheckResult::Block).is_error());
        assert!(!pass.with_success(true).is_error());
    }
}
