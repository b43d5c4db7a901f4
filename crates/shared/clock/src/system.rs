use chrono::Utc;
use twinfeed_core::Timestamp;

use crate::Clock;

/// Real system clock for production use
///
/// This simply returns the current wall-clock time in UTC.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
