//! Injectable clock
//!
//! Every expiry and revocation decision in this crate reads time through
//! this trait, so tests can drive the token lifecycle deterministically.

use chrono::{DateTime, Utc};

/// Process-wide time source
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
