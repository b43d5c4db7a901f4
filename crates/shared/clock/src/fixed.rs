use chrono::Duration;
use parking_lot::Mutex;
use twinfeed_core::Timestamp;

use crate::Clock;

/// Deterministic clock for tests
///
/// Returns the stored time and then moves it forward by `step`
/// (zero step keeps time frozen).
pub struct FixedClock {
    current: Mutex<Timestamp>,
    step: Duration,
}

impl FixedClock {
    /// Frozen clock
    pub fn new(time: Timestamp) -> Self {
        Self::stepping(time, Duration::zero())
    }

    /// Clock that advances by `step` after every reading
    pub fn stepping(start: Timestamp, step: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            step,
        }
    }

    /// Jump to a specific time
    pub fn set(&self, time: Timestamp) {
        *self.current.lock() = time;
    }

    /// Move time forward without reading it
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current = *current + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let mut current = self.current.lock();
        let now = *current;
        *current = *current + self.step;
        now
    }

    fn name(&self) -> &str {
        "FixedClock"
    }
}
