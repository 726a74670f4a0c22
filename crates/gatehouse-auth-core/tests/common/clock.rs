//! Manually advanced clock for deterministic lifecycle tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use gatehouse_auth_core::Clock;
use std::sync::Mutex;

/// A clock that only moves when a test tells it to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at a fixed, arbitrary instant
    pub fn new() -> Self {
        Self::at(1_700_000_000)
    }

    /// Start at the given seconds timestamp
    pub fn at(ts: i64) -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(ts, 0).unwrap()),
        }
    }

    /// Advance the clock by whole seconds
    pub fn advance_secs(&self, secs: i64) {
        let mut guard = self.now.lock().unwrap();
        *guard += Duration::seconds(secs);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
