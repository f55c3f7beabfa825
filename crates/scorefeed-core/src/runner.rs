//! Poll loop runner with operator controls.
//!
//! [`run_poller`] drives [`run_cycle`] on a runtime-adjustable interval
//! until an operator stop or the configured cycle bound. The sleep between
//! cycles is cancellable, and under a paused tokio clock the whole loop runs
//! without real waiting.
//!
//! [`run_cycle`]: crate::pipeline::run_cycle

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::control::PollControl;
use crate::feed::FeedSource;
use crate::pipeline::{self, CycleSummary, FeedState};

/// Reason the poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollEndReason {
    /// Reached the configured `max_cycles` limit.
    MaxCyclesReached,
    /// An operator issued a stop command.
    OperatorStop,
}

/// Result of a poll run.
#[derive(Debug)]
pub struct PollResult {
    /// Why polling ended.
    pub end_reason: PollEndReason,
    /// Number of cycles executed.
    pub total_cycles: u64,
    /// The last cycle summary, if any cycle ran.
    pub last_summary: Option<CycleSummary>,
}

/// Callback invoked after each cycle completes.
///
/// The engine uses this to publish copies of the state to the observer.
pub trait CycleCallback: Send {
    /// Called after every cycle, whatever its outcome.
    fn on_cycle(&mut self, summary: &CycleSummary, state: &FeedState);
}

/// A no-op cycle callback for testing.
pub struct NoOpCallback;

impl CycleCallback for NoOpCallback {
    fn on_cycle(&mut self, _summary: &CycleSummary, _state: &FeedState) {}
}

/// Poll the feed until stopped or bounded.
///
/// Cycle failures never end the loop; they are reported through the
/// summaries and retried on the next cycle.
pub async fn run_poller<F: FeedSource>(
    state: &mut FeedState,
    feed: &mut F,
    control: &PollControl,
    callback: &mut dyn CycleCallback,
) -> PollResult {
    let mut last_summary: Option<CycleSummary> = None;
    let mut total_cycles: u64 = 0;

    info!(
        max_cycles = control.max_cycles(),
        poll_interval_ms = control.poll_interval_ms(),
        "Polling starting"
    );

    loop {
        if control.is_stop_requested() {
            info!("Operator stop requested");
            return PollResult {
                end_reason: PollEndReason::OperatorStop,
                total_cycles,
                last_summary,
            };
        }

        let summary = pipeline::run_cycle(state, feed).await;
        total_cycles = total_cycles.saturating_add(1);

        callback.on_cycle(&summary, state);

        if control.cycle_limit_reached(total_cycles) {
            info!(
                cycle = summary.cycle,
                max_cycles = control.max_cycles(),
                "Cycle limit reached"
            );
            return PollResult {
                end_reason: PollEndReason::MaxCyclesReached,
                total_cycles,
                last_summary: Some(summary),
            };
        }

        last_summary = Some(summary);

        // A stop during the sleep is picked up at the top of the loop.
        control.sleep_or_stop(control.poll_interval()).await;
    }
}

/// Log the end of a poll run.
pub fn log_poll_end(result: &PollResult) {
    info!(
        reason = ?result.end_reason,
        total_cycles = result.total_cycles,
        "Polling ended"
    );

    if let Some(ref summary) = result.last_summary {
        info!(
            cycle = summary.cycle,
            outcome = summary.outcome.label(),
            live_events = summary.live_events,
            archived_events = summary.archived_events,
            refresh_pending = summary.refresh_pending,
            "Final cycle summary"
        );
    } else {
        warn!("Polling ended with no cycles executed");
    }
}
