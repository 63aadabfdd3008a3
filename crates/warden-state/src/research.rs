// research.rs — ResearchStatus: which research categories are done, and when.
//
// Five fixed categories. A category is either absent (not done) or carries the
// timestamp at which it was explicitly marked complete. The whole record is
// reset whenever research has to start over.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Domain;

/// A research category that must be covered before editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResearchCategory {
    /// Prior knowledge stored in the agent's memory tools.
    Memory,
    /// Official documentation for the libraries involved.
    Docs,
    /// General web search.
    Web,
    /// Real-world usage in other projects.
    ExternalExamples,
    /// The project's own code.
    LocalCode,
}

impl ResearchCategory {
    /// All categories, in display order.
    pub const ALL: [ResearchCategory; 5] = [
        ResearchCategory::Memory,
        ResearchCategory::Docs,
        ResearchCategory::Web,
        ResearchCategory::ExternalExamples,
        ResearchCategory::LocalCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchCategory::Memory => "memory",
            ResearchCategory::Docs => "docs",
            ResearchCategory::Web => "web",
            ResearchCategory::ExternalExamples => "external-examples",
            ResearchCategory::LocalCode => "local-code",
        }
    }
}

impl fmt::Display for ResearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a category name is not one of the five known categories.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown research category '{0}' (expected one of: memory, docs, web, external-examples, local-code)")]
pub struct ParseCategoryError(pub String);

impl FromStr for ResearchCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ResearchCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Completion timestamps per research category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchStatus {
    #[serde(default)]
    completed: BTreeMap<ResearchCategory, DateTime<Utc>>,
}

impl Domain for ResearchStatus {
    const NAME: &'static str = "research";
}

impl ResearchStatus {
    /// Mark a category complete at `at`. Re-marking overwrites the timestamp.
    pub fn mark_complete(&mut self, category: ResearchCategory, at: DateTime<Utc>) {
        self.completed.insert(category, at);
    }

    pub fn is_complete(&self, category: ResearchCategory) -> bool {
        self.completed.contains_key(&category)
    }

    pub fn completed_at(&self, category: ResearchCategory) -> Option<DateTime<Utc>> {
        self.completed.get(&category).copied()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn all_complete(&self) -> bool {
        ResearchCategory::ALL.iter().all(|c| self.is_complete(*c))
    }

    /// Categories not yet marked complete, in display order.
    pub fn missing(&self) -> Vec<ResearchCategory> {
        ResearchCategory::ALL
            .into_iter()
            .filter(|c| !self.is_complete(*c))
            .collect()
    }

    /// All recorded completion timestamps.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.completed.values().copied().collect()
    }
}
