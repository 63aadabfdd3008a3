// halt.rs — HaltState: a user-issued pause of all mutating tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Domain;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltState {
    #[serde(default)]
    pub halted: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

impl Domain for HaltState {
    const NAME: &'static str = "halt";
}

impl HaltState {
    pub fn halt(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.halted = true;
        self.reason = Some(reason.into());
        self.since = Some(at);
    }

    pub fn resume(&mut self) {
        *self = Self::default();
    }
}
