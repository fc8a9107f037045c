//! Last-activity timestamp shared between output readers and the watchdog

use crate::utils::now_millis;
use std::sync::atomic::{AtomicI64, Ordering};

/// Epoch-millisecond timestamp of the last observed output line
#[derive(Debug)]
pub struct ActivityClock {
    last_ms: AtomicI64,
}

impl ActivityClock {
    /// Create a clock that last saw activity at `now_ms`
    pub fn new(now_ms: i64) -> Self {
        Self {
            last_ms: AtomicI64::new(now_ms),
        }
    }

    /// Create a clock starting at the current wall-clock time
    pub fn starting_now() -> Self {
        Self::new(now_millis())
    }

    /// Record activity at the current time
    pub fn touch(&self) {
        self.touch_at(now_millis());
    }

    /// Record activity at `now_ms`. Never moves the clock backwards.
    pub fn touch_at(&self, now_ms: i64) {
        self.last_ms.fetch_max(now_ms, Ordering::AcqRel);
    }

    /// Timestamp of the last recorded activity
    pub fn last_activity_ms(&self) -> i64 {
        self.last_ms.load(Ordering::Acquire)
    }

    /// Milliseconds since the last activity, as seen at `now_ms`
    pub fn idle_for(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_activity_ms()).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_advances() {
        let clock = ActivityClock::new(1_000);
        clock.touch_at(4_000);
        assert_eq!(clock.last_activity_ms(), 4_000);
        assert_eq!(clock.idle_for(6_500), 2_500);
    }

    #[test]
    fn test_touch_never_goes_backwards() {
        let clock = ActivityClock::new(5_000);
        clock.touch_at(3_000);
        assert_eq!(clock.last_activity_ms(), 5_000);
    }

    #[test]
    fn test_idle_for_is_never_negative() {
        let clock = ActivityClock::new(5_000);
        assert_eq!(clock.idle_for(4_000), 0);
    }
}
