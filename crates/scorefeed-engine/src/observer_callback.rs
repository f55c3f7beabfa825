//! Cycle callback that updates the Observer API state.
//!
//! After each cycle, this callback replaces the observer's [`FeedView`]
//! with a fresh copy of the pipeline state and broadcasts a
//! [`CycleBroadcast`] to all connected `WebSocket` clients. The poll loop
//! never waits on a reader: a contended update is finished on a spawned
//! task.

use std::sync::Arc;

use scorefeed_core::pipeline::{CycleSummary, FeedState};
use scorefeed_core::runner::CycleCallback;
use scorefeed_observer::state::{AppState, CycleBroadcast, FeedView};
use tracing::debug;

/// Callback that bridges the poll loop to the Observer API.
pub struct ObserverCallback {
    state: Arc<AppState>,
}

impl ObserverCallback {
    /// Create a new observer callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl CycleCallback for ObserverCallback {
    fn on_cycle(&mut self, summary: &CycleSummary, state: &FeedState) {
        let receivers = self.state.broadcast(&CycleBroadcast::from_summary(summary));
        debug!(cycle = summary.cycle, receivers, "Cycle broadcast sent");

        let captured = FeedView::capture(state);
        match self.state.snapshot.try_write() {
            Ok(mut view) => *view = captured,
            Err(_) => {
                // A reader holds the view. Install the copy as soon as it lets
                // go, unless a later cycle got there first.
                debug!(cycle = summary.cycle, "Observer view busy, deferring update");
                let snapshot = Arc::clone(&self.state.snapshot);
                tokio::spawn(async move {
                    let mut view = snapshot.write().await;
                    if view.cycle <= captured.cycle {
                        *view = captured;
                    }
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scorefeed_core::feed::StaticFeed;
    use scorefeed_core::pipeline::run_cycle;

    use super::*;

    #[tokio::test]
    async fn publishes_view_and_broadcast() {
        let app = Arc::new(AppState::new());
        let mut rx = app.subscribe();
        let mut callback = ObserverCallback::new(Arc::clone(&app));

        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping("s1:FOOTBALL;ACTIVE:LIVE")
            .with_snapshot("e1,s1,c1,0,h1,a1,ACTIVE");
        run_cycle(&mut state, &mut feed).await;
        let summary = run_cycle(&mut state, &mut feed).await;

        callback.on_cycle(&summary, &state);

        let view = app.snapshot.read().await;
        assert_eq!(view.cycle, 2);
        assert_eq!(view.live.get("e1").unwrap().sport, "FOOTBALL");
        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.outcome, "decoded");
        assert_eq!(msg.live_events, 1);
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn busy_view_is_updated_once_the_reader_leaves() {
        let app = Arc::new(AppState::new());
        let mut callback = ObserverCallback::new(Arc::clone(&app));
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_mapping("s1:FOOTBALL");
        let summary = run_cycle(&mut state, &mut feed).await;

        let reader = app.snapshot.read().await;
        callback.on_cycle(&summary, &state);
        assert_eq!(reader.cycle, 0);
        drop(reader);

        settle().await;
        let view = app.snapshot.read().await;
        assert_eq!(view.cycle, 1);
        assert!(!view.refresh_pending);
    }

    #[tokio::test]
    async fn rollover_published_while_busy_empties_the_live_view() {
        let app = Arc::new(AppState::new());
        let mut callback = ObserverCallback::new(Arc::clone(&app));
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping("s1:FOOTBALL")
            .with_snapshot("e1,s1,c1,0,h1,a1,ACTIVE");
        for _ in 0..2 {
            let summary = run_cycle(&mut state, &mut feed).await;
            callback.on_cycle(&summary, &state);
        }
        assert_eq!(app.snapshot.read().await.live.len(), 1);

        let mut next = StaticFeed::new()
            .with_mapping("s9:TENNIS")
            .with_snapshot("e7,s9,c1,0,p1,p2,ON");
        let summary = run_cycle(&mut state, &mut next).await;
        let reader = app.snapshot.read().await;
        callback.on_cycle(&summary, &state);
        drop(reader);

        settle().await;
        let view = app.snapshot.read().await;
        assert!(view.live.is_empty());
        assert_eq!(view.archive.len(), 1);
    }

    #[tokio::test]
    async fn deferred_copy_never_overwrites_a_newer_cycle() {
        let app = Arc::new(AppState::new());
        let mut callback = ObserverCallback::new(Arc::clone(&app));
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping("s1:FOOTBALL")
            .with_snapshot("e1,s1,c1,0,h1,a1,ACTIVE");

        let first = run_cycle(&mut state, &mut feed).await;
        let reader = app.snapshot.read().await;
        callback.on_cycle(&first, &state);
        drop(reader);

        let second = run_cycle(&mut state, &mut feed).await;
        callback.on_cycle(&second, &state);

        settle().await;
        assert_eq!(app.snapshot.read().await.cycle, 2);
    }
}
