// requirements.rs — RequirementSet: obligations detected from user intent.
//
// When the user's prompt asks for research, a plan, or tests, those names land
// in `requested`. Checks move names into `satisfied` as evidence accumulates.
// The whole set is replaced when new intent is detected.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Domain;

/// Requested and satisfied requirements for the current piece of work.
///
/// Fields are private so `satisfied ⊆ requested` can only be upheld through
/// the methods below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    #[serde(default)]
    requested: Vec<String>,
    #[serde(default)]
    satisfied: BTreeSet<String>,
    #[serde(default)]
    modifiers: BTreeSet<String>,
    /// Evidence counters by kind ("research", "tests", "plan").
    #[serde(default)]
    evidence: BTreeMap<String, u32>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl Domain for RequirementSet {
    const NAME: &'static str = "requirements";
}

impl RequirementSet {
    /// Build a fresh set. Duplicate requirement names keep their first position.
    pub fn new<I, M>(requested: I, modifiers: M, at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = String>,
        M: IntoIterator<Item = String>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for name in requested {
            if !ordered.contains(&name) {
                ordered.push(name);
            }
        }
        Self {
            requested: ordered,
            satisfied: BTreeSet::new(),
            modifiers: modifiers.into_iter().collect(),
            evidence: BTreeMap::new(),
            timestamp: Some(at),
        }
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn is_requested(&self, name: &str) -> bool {
        self.requested.iter().any(|r| r == name)
    }

    pub fn is_satisfied(&self, name: &str) -> bool {
        self.is_requested(name) && self.satisfied.contains(name)
    }

    /// Requested but not yet satisfied, in request order.
    pub fn unsatisfied(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|r| !self.satisfied.contains(r.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Satisfied requirements (always a subset of `requested`).
    pub fn satisfied(&self) -> Vec<&str> {
        self.requested
            .iter()
            .filter(|r| self.satisfied.contains(r.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Mark a requirement satisfied. Returns `true` if this changed anything.
    ///
    /// Names that were never requested are ignored.
    pub fn mark_satisfied(&mut self, name: &str, at: DateTime<Utc>) -> bool {
        if !self.is_requested(name) || self.satisfied.contains(name) {
            return false;
        }
        self.satisfied.insert(name.to_string());
        self.timestamp = Some(at);
        true
    }

    pub fn modifiers(&self) -> &BTreeSet<String> {
        &self.modifiers
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.contains(name)
    }

    /// Add one unit of evidence and return the new count.
    pub fn add_evidence(&mut self, kind: &str) -> u32 {
        let count = self.evidence.entry(kind.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn evidence(&self, kind: &str) -> u32 {
        self.evidence.get(kind).copied().unwrap_or(0)
    }

    pub fn clear_evidence(&mut self, kind: &str) {
        self.evidence.remove(kind);
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}
