// rules.rs — Rule-tracking log: every rule violation, one JSON line each.
//
// The engine appends a violation for every blocking finding. The task loop
// appends self-reported violations (`loop log ... <rule>`). The SOP score of
// a task loop is computed from the unique rule ids logged since it started.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Who reported the violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSource {
    /// A rule check blocked an action.
    Engine,
    /// The agent logged a task-loop step against a rule it broke.
    SelfReported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleViolation {
    pub timestamp: DateTime<Utc>,
    /// Stable rule identifier, e.g. "blocked-path".
    pub rule: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub source: ViolationSource,
}

impl RuleViolation {
    pub fn new(rule: impl Into<String>, message: impl Into<String>, source: ViolationSource) -> Self {
        Self {
            timestamp: Utc::now(),
            rule: rule.into(),
            message: message.into(),
            tool: None,
            source,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Append-only violation log. Opens the file per call; writes are rare.
#[derive(Debug, Clone)]
pub struct RuleLog {
    path: PathBuf,
}

impl RuleLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, violation: &RuleViolation) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AuditError::OpenFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| AuditError::OpenFailed {
                path: self.path.clone(),
                source,
            })?;
        let json = serde_json::to_string(violation)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// All parseable violations, oldest first. A missing file is an empty log.
    pub fn read_all(&self) -> Result<Vec<RuleViolation>, AuditError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(|source| AuditError::OpenFailed {
            path: self.path.clone(),
            source,
        })?;
        let mut violations = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RuleViolation>(&line) {
                Ok(v) => violations.push(v),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable rule log line"),
            }
        }
        Ok(violations)
    }

    /// Violations logged at or after `since`.
    pub fn since(&self, since: DateTime<Utc>) -> Result<Vec<RuleViolation>, AuditError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|v| v.timestamp >= since)
            .collect())
    }

    /// Unique rule ids violated at or after `since`.
    pub fn unique_rules_since(&self, since: DateTime<Utc>) -> Result<BTreeSet<String>, AuditError> {
        Ok(self.since(since)?.into_iter().map(|v| v.rule).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    #[test]
    fn unique_rules_since_ignores_older_and_duplicates() {
        let dir = tempdir().unwrap();
        let log = RuleLog::new(dir.path().join("rules.jsonl"));
        let start = Utc::now();

        log.append(
            &RuleViolation::new("blocked-path", "old", ViolationSource::Engine)
                .with_timestamp(start - Duration::minutes(5)),
        )
        .unwrap();
        log.append(&RuleViolation::new("file-size", "a", ViolationSource::Engine).with_tool("Write"))
            .unwrap();
        log.append(&RuleViolation::new("file-size", "b", ViolationSource::Engine))
            .unwrap();
        log.append(&RuleViolation::new("lazy-commit", "c", ViolationSource::SelfReported))
            .unwrap();

        let unique = log.unique_rules_since(start).unwrap();
        assert_eq!(unique.len(), 2);
        assert!(unique.contains("file-size"));
        assert!(unique.contains("lazy-commit"));
        assert_eq!(log.read_all().unwrap().len(), 4);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = RuleLog::new(dir.path().join("nested/rules.jsonl"));
        assert!(log.read_all().unwrap().is_empty());
        log.append(&RuleViolation::new("x", "y", ViolationSource::Engine))
            .unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }
}
