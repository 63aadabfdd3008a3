// breaker.rs — CircuitBreaker: the session-wide kill switch.
//
// State machine:
//
//   closed (failures < threshold) ──record_failure──▶ tripped (failures >= threshold)
//   tripped ──reset()──▶ closed
//
// Nothing closes a tripped breaker automatically. Only an explicit reset (or
// the session-start courtesy reset, which goes through the same `reset()`)
// clears it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Domain;

/// Failures needed to trip a breaker that was never reconfigured.
pub const DEFAULT_BREAKER_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    #[serde(default)]
    pub failures: u32,
    #[serde(default)]
    pub tripped: bool,
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub tripped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reset_at: Option<DateTime<Utc>>,
}

fn default_threshold() -> u32 {
    DEFAULT_BREAKER_THRESHOLD
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self {
            failures: 0,
            tripped: false,
            threshold: DEFAULT_BREAKER_THRESHOLD,
            last_error: None,
            tripped_at: None,
            reset_at: None,
        }
    }
}

impl Domain for CircuitBreaker {
    const NAME: &'static str = "circuit_breaker";
}

impl CircuitBreaker {
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Count one failed verification. Returns `true` if this failure tripped
    /// the breaker.
    pub fn record_failure(&mut self, error: impl Into<String>, at: DateTime<Utc>) -> bool {
        self.failures += 1;
        self.last_error = Some(error.into());
        self.trip_if_due(at)
    }

    /// Close the breaker and clear the failure count. The threshold is kept.
    pub fn reset(&mut self, at: DateTime<Utc>) {
        self.failures = 0;
        self.tripped = false;
        self.tripped_at = None;
        self.last_error = None;
        self.reset_at = Some(at);
    }

    /// Change the threshold. A threshold of zero is treated as one.
    ///
    /// Lowering the threshold below the current failure count trips the
    /// breaker; raising it never closes an already tripped breaker.
    pub fn set_threshold(&mut self, threshold: u32, at: DateTime<Utc>) -> bool {
        self.threshold = threshold.max(1);
        self.trip_if_due(at)
    }

    fn trip_if_due(&mut self, at: DateTime<Utc>) -> bool {
        if !self.tripped && self.failures >= self.threshold {
            self.tripped = true;
            self.tripped_at = Some(at);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_exactly_at_threshold() {
        let mut breaker = CircuitBreaker::default();
        for i in 1..DEFAULT_BREAKER_THRESHOLD {
            assert!(!breaker.record_failure(format!("fail {}", i), Utc::now()));
            assert!(!breaker.is_tripped());
        }
        assert!(breaker.record_failure("final", Utc::now()));
        assert!(breaker.is_tripped());
        assert_eq!(breaker.failures, DEFAULT_BREAKER_THRESHOLD);
        assert!(breaker.tripped_at.is_some());
    }

    #[test]
    fn further_failures_do_not_retrip() {
        let mut breaker = CircuitBreaker::default();
        breaker.set_threshold(1, Utc::now());
        assert!(breaker.record_failure("a", Utc::now()));
        assert!(!breaker.record_failure("b", Utc::now()));
        assert!(breaker.is_tripped());
    }

    #[test]
    fn reset_closes_and_keeps_threshold() {
        let mut breaker = CircuitBreaker::default();
        breaker.set_threshold(2, Utc::now());
        breaker.record_failure("a", Utc::now());
        breaker.record_failure("b", Utc::now());
        assert!(breaker.is_tripped());

        breaker.reset(Utc::now());
        assert!(!breaker.is_tripped());
        assert_eq!(breaker.failures, 0);
        assert_eq!(breaker.threshold, 2);
        assert!(breaker.reset_at.is_some());
    }

    #[test]
    fn raising_threshold_keeps_breaker_tripped() {
        let mut breaker = CircuitBreaker::default();
        breaker.set_threshold(1, Utc::now());
        breaker.record_failure("a", Utc::now());
        breaker.set_threshold(10, Utc::now());
        assert!(breaker.is_tripped());
    }

    #[test]
    fn old_records_without_threshold_get_default() {
        let breaker: CircuitBreaker = serde_json::from_str(r#"{"failures": 2}"#).unwrap();
        assert_eq!(breaker.threshold, DEFAULT_BREAKER_THRESHOLD);
        assert!(!breaker.tripped);
    }
}
