// attempts.rs — EditAttemptCounter: edits tried before research was done.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Domain;

/// How many premature edit attempts force research to restart.
pub const EDIT_ATTEMPT_CEILING: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditAttemptCounter {
    pub count: u32,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl Domain for EditAttemptCounter {
    const NAME: &'static str = "edit_attempts";
}

impl EditAttemptCounter {
    /// Record one attempt. Returns `true` when the ceiling was reached, in
    /// which case the count is already back at zero and the caller must reset
    /// research status.
    pub fn record(&mut self, at: DateTime<Utc>) -> bool {
        self.count += 1;
        self.last_attempt = Some(at);
        if self.count >= EDIT_ATTEMPT_CEILING {
            self.count = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_resets_count() {
        let mut counter = EditAttemptCounter::default();
        assert!(!counter.record(Utc::now()));
        assert!(!counter.record(Utc::now()));
        assert_eq!(counter.count, 2);
        assert!(counter.record(Utc::now()));
        assert_eq!(counter.count, 0);
        assert!(counter.last_attempt.is_some());
    }
}
