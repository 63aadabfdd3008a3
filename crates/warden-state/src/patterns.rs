// patterns.rs — PatternLog: how often suspicious patterns were detected.
//
// Counters grow without bound; the event buffer keeps only the most recent
// detections. This is telemetry: losing a write must not block the agent.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Domain;

/// Number of detection events kept in the ring buffer.
pub const PATTERN_EVENT_CAPACITY: usize = 10;

/// One detection of a named pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEvent {
    pub pattern: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternLog {
    #[serde(default)]
    counters: BTreeMap<String, u32>,
    #[serde(default)]
    events: VecDeque<PatternEvent>,
}

impl Domain for PatternLog {
    const NAME: &'static str = "pattern_log";
    const CRITICAL: bool = false;
}

impl PatternLog {
    /// Record a detection and return the pattern's new cumulative count.
    pub fn record(
        &mut self,
        pattern: impl Into<String>,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> u32 {
        let pattern = pattern.into();
        let count = self.counters.entry(pattern.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        self.events.push_back(PatternEvent {
            pattern,
            timestamp: at,
            reason: reason.into(),
        });
        while self.events.len() > PATTERN_EVENT_CAPACITY {
            self.events.pop_front();
        }
        count
    }

    pub fn count(&self, pattern: &str) -> u32 {
        self.counters.get(pattern).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &BTreeMap<String, u32> {
        &self.counters
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &PatternEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_cumulative_but_buffer_is_bounded() {
        let mut log = PatternLog::default();
        for i in 0..15 {
            log.record("gaming", format!("reason {}", i), Utc::now());
        }
        assert_eq!(log.count("gaming"), 15);
        let events: Vec<_> = log.events().collect();
        assert_eq!(events.len(), PATTERN_EVENT_CAPACITY);
        // Oldest five were evicted.
        assert_eq!(events[0].reason, "reason 5");
        assert_eq!(events[9].reason, "reason 14");
    }

    #[test]
    fn counters_are_per_pattern() {
        let mut log = PatternLog::default();
        assert_eq!(log.record("gaming", "x", Utc::now()), 1);
        assert_eq!(log.record("lazy", "y", Utc::now()), 1);
        assert_eq!(log.record("gaming", "z", Utc::now()), 2);
        assert_eq!(log.count("unknown"), 0);
    }
}
