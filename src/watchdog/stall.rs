//! Stall watchdog
//!
//! Runs next to a recording child process. Every tick it compares the wall clock
//! to the shared `ActivityClock` and, once no output has been seen for longer
//! than the stall timeout, requests that the child be killed.

use super::clock::ActivityClock;
use crate::utils::now_millis;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How a watchdog run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The child exited on its own (or was otherwise reaped) first
    ChildExited,
    /// Output stalled and a kill was requested
    Stalled { idle_ms: i64 },
}

/// Periodic output-inactivity check for one session
#[derive(Debug, Clone, Copy)]
pub struct StallWatchdog {
    interval: Duration,
    timeout: Duration,
}

impl StallWatchdog {
    /// A zero `interval` is raised to 1ms; tokio refuses a zero period
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            timeout,
        }
    }

    /// Whether the clock has been idle for strictly longer than the timeout
    pub fn is_stalled(&self, clock: &ActivityClock, now_ms: i64) -> bool {
        clock.idle_for(now_ms) > self.timeout.as_millis() as i64
    }

    /// Watch `clock` until the child exits or output stalls.
    ///
    /// `exited` flips to `true` (or its sender is dropped) once the child has
    /// been reaped. On a stall the watchdog fires `kill` and returns; if nobody
    /// is listening any more the request is dropped silently.
    pub async fn watch(
        self,
        clock: Arc<ActivityClock>,
        mut exited: watch::Receiver<bool>,
        kill: oneshot::Sender<()>,
    ) -> WatchdogOutcome {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = exited.changed() => {
                    if changed.is_err() {
                        return WatchdogOutcome::ChildExited;
                    }
                }
            }

            if *exited.borrow() {
                return WatchdogOutcome::ChildExited;
            }

            let now = now_millis();
            if self.is_stalled(&clock, now) {
                let idle_ms = clock.idle_for(now);
                tracing::warn!(
                    "No output for {}ms (limit {:?}), killing recorder",
                    idle_ms,
                    self.timeout
                );
                let _ = kill.send(());
                return WatchdogOutcome::Stalled { idle_ms };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn quick() -> StallWatchdog {
        StallWatchdog::new(Duration::from_millis(20), Duration::from_millis(150))
    }

    #[test]
    fn test_is_stalled_is_strict() {
        let watchdog = StallWatchdog::new(Duration::from_secs(5), Duration::from_secs(20));
        let clock = ActivityClock::new(0);
        assert!(!watchdog.is_stalled(&clock, 20_000));
        assert!(watchdog.is_stalled(&clock, 20_001));
    }

    #[tokio::test]
    async fn test_silent_child_is_killed() {
        let clock = Arc::new(ActivityClock::starting_now());
        let (_exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = oneshot::channel();

        let started = Instant::now();
        let outcome = quick().watch(clock, exit_rx, kill_tx).await;

        assert!(matches!(outcome, WatchdogOutcome::Stalled { idle_ms } if idle_ms > 150));
        assert!(kill_rx.await.is_ok());
        // Threshold plus at most one tick, with scheduling slack
        assert!(started.elapsed() < Duration::from_millis(150 + 20 + 500));
    }

    #[tokio::test]
    async fn test_zero_interval_still_detects_stall() {
        let watchdog = StallWatchdog::new(Duration::ZERO, Duration::from_millis(100));
        let clock = Arc::new(ActivityClock::starting_now());
        let (_exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = oneshot::channel();

        let outcome = tokio::spawn(watchdog.watch(clock, exit_rx, kill_tx))
            .await
            .unwrap();

        assert!(matches!(outcome, WatchdogOutcome::Stalled { idle_ms } if idle_ms > 100));
        assert!(kill_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_exit_stops_watchdog() {
        let clock = Arc::new(ActivityClock::starting_now());
        let (exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, mut kill_rx) = oneshot::channel();

        let handle = tokio::spawn(quick().watch(clock, exit_rx, kill_tx));
        tokio::time::sleep(Duration::from_millis(40)).await;
        exit_tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), WatchdogOutcome::ChildExited);
        assert!(kill_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_exit_sender_stops_watchdog() {
        let clock = Arc::new(ActivityClock::starting_now());
        let (exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, _kill_rx) = oneshot::channel();
        drop(exit_tx);

        let outcome = quick().watch(clock, exit_rx, kill_tx).await;
        assert_eq!(outcome, WatchdogOutcome::ChildExited);
    }

    #[tokio::test]
    async fn test_steady_output_keeps_child_alive() {
        let clock = Arc::new(ActivityClock::starting_now());
        let (exit_tx, exit_rx) = watch::channel(false);
        let (kill_tx, mut kill_rx) = oneshot::channel();

        let handle = tokio::spawn(quick().watch(clock.clone(), exit_rx, kill_tx));
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(30)).await;
            clock.touch();
        }
        assert!(kill_rx.try_recv().is_err());

        // Output stops; the watchdog fires shortly after the timeout
        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, WatchdogOutcome::Stalled { .. }));
        drop(exit_tx);
    }
}
