//! Poll control state shared between the scheduler and the operator API.
//!
//! The scheduler reads the interval and stop flag on every cycle; operator
//! handlers write them. All fields are atomics so neither side takes a lock.
//! A stop request also wakes a scheduler that is sleeping between cycles.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::warn;

/// Smallest poll interval the operator may set, in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Shared scheduler control state. Wrap it in an `Arc`.
#[derive(Debug)]
pub struct PollControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wakes the scheduler out of its inter-cycle sleep.
    stop_notify: Notify,

    /// Current poll interval in milliseconds.
    poll_interval_ms: AtomicU64,

    /// Maximum number of cycles (0 = unlimited).
    max_cycles: u64,

    /// Wall-clock time the scheduler was created.
    started_at: DateTime<Utc>,
}

impl PollControl {
    /// Create control state with the given interval and cycle bound.
    ///
    /// An interval below [`MIN_POLL_INTERVAL_MS`] is raised to it.
    pub fn new(poll_interval_ms: u64, max_cycles: u64) -> Self {
        if poll_interval_ms < MIN_POLL_INTERVAL_MS {
            warn!(
                requested_ms = poll_interval_ms,
                applied_ms = MIN_POLL_INTERVAL_MS,
                "Poll interval below minimum, clamping"
            );
        }
        Self {
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            poll_interval_ms: AtomicU64::new(poll_interval_ms.max(MIN_POLL_INTERVAL_MS)),
            max_cycles,
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop and wake the scheduler if it is sleeping.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Sleep for `duration` unless a stop arrives first.
    ///
    /// Returns `true` if the full sleep elapsed, `false` if it was cut short
    /// by a stop request.
    pub async fn sleep_or_stop(&self, duration: Duration) -> bool {
        if self.is_stop_requested() {
            return false;
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => !self.is_stop_requested(),
            () = self.stop_notify.notified() => false,
        }
    }

    // -----------------------------------------------------------------------
    // Interval
    // -----------------------------------------------------------------------

    /// Current poll interval in milliseconds.
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.load(Ordering::Acquire)
    }

    /// Current poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms())
    }

    /// Set the poll interval. Must be at least [`MIN_POLL_INTERVAL_MS`].
    ///
    /// Returns the previous interval, or `None` if the value was rejected.
    pub fn set_poll_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_POLL_INTERVAL_MS {
            return None;
        }
        Some(self.poll_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    /// Whether `completed` cycles reach the configured bound.
    pub const fn cycle_limit_reached(&self, completed: u64) -> bool {
        self.max_cycles > 0 && completed >= self.max_cycles
    }

    /// Configured maximum cycles (0 = unlimited).
    pub const fn max_cycles(&self) -> u64 {
        self.max_cycles
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds elapsed since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Build the JSON status for the operator API.
    pub fn status(&self, cycle: u64, refresh_pending: bool) -> PollStatus {
        PollStatus {
            cycle,
            stop_requested: self.is_stop_requested(),
            poll_interval_ms: self.poll_interval_ms(),
            max_cycles: self.max_cycles,
            refresh_pending,
            elapsed_seconds: self.elapsed_seconds(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable scheduler status for the operator API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatus {
    /// Cycles started so far.
    pub cycle: u64,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Configured maximum cycles (0 = unlimited).
    pub max_cycles: u64,
    /// Whether decoding is suppressed pending a mapping refresh.
    pub refresh_pending: bool,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// RFC 3339 timestamp of when polling started.
    pub started_at: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let control = PollControl::new(5000, 0);
        assert!(!control.is_stop_requested());
        assert_eq!(control.poll_interval_ms(), 5000);
        assert_eq!(control.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn startup_interval_is_clamped_to_minimum() {
        let control = PollControl::new(0, 0);
        assert_eq!(control.poll_interval_ms(), MIN_POLL_INTERVAL_MS);

        let control = PollControl::new(MIN_POLL_INTERVAL_MS - 1, 0);
        assert_eq!(control.poll_interval_ms(), MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn zero_interval_from_config_is_clamped() {
        let config = crate::config::ScorefeedConfig::parse("feed:\n  poll_interval_ms: 0\n").unwrap();
        let control = PollControl::new(config.feed.poll_interval_ms, config.run.max_cycles);
        assert_eq!(control.poll_interval_ms(), MIN_POLL_INTERVAL_MS);
        assert!(control.set_poll_interval_ms(0).is_none());
    }

    #[test]
    fn set_interval_returns_previous() {
        let control = PollControl::new(5000, 0);
        assert_eq!(control.set_poll_interval_ms(250), Some(5000));
        assert_eq!(control.poll_interval_ms(), 250);
    }

    #[test]
    fn reject_sub_minimum_interval() {
        let control = PollControl::new(5000, 0);
        assert!(control.set_poll_interval_ms(99).is_none());
        assert_eq!(control.poll_interval_ms(), 5000);
        assert_eq!(control.set_poll_interval_ms(100), Some(5000));
    }

    #[test]
    fn zero_cycle_limit_is_unlimited() {
        let control = PollControl::new(5000, 0);
        assert!(!control.cycle_limit_reached(1_000_000));
    }

    #[test]
    fn cycle_limit() {
        let control = PollControl::new(5000, 3);
        assert!(!control.cycle_limit_reached(2));
        assert!(control.cycle_limit_reached(3));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_to_completion_without_stop() {
        let control = PollControl::new(5000, 0);
        assert!(control.sleep_or_stop(Duration::from_secs(5)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cuts_sleep_short() {
        let control = std::sync::Arc::new(PollControl::new(5000, 0));
        let sleeper = std::sync::Arc::clone(&control);
        let handle = tokio::spawn(async move { sleeper.sleep_or_stop(Duration::from_secs(3600)).await });

        tokio::task::yield_now().await;
        control.request_stop();

        assert!(!handle.await.unwrap_or(true));
    }

    #[tokio::test]
    async fn sleep_after_stop_returns_immediately() {
        let control = PollControl::new(5000, 0);
        control.request_stop();
        assert!(!control.sleep_or_stop(Duration::from_secs(3600)).await);
    }

    #[test]
    fn status_reflects_state() {
        let control = PollControl::new(1000, 10);
        control.request_stop();
        let status = control.status(4, true);
        assert_eq!(status.cycle, 4);
        assert!(status.stop_requested);
        assert!(status.refresh_pending);
        assert_eq!(status.max_cycles, 10);
    }
}
