//! One poll cycle: fetch, guard, decode, reconcile.
//!
//! [`FeedState`] is the single owner of the dictionary, the event store, and
//! the refresh gate. [`run_cycle`] takes it by `&mut`, so one cycle always
//! runs to completion before anything else can touch the state, and the
//! only suspension points are the feed fetches.
//!
//! # Cycle paths
//!
//! 1. **Refresh path** -- a refresh is pending: fetch and install a mapping.
//!    No snapshot is fetched or decoded in this cycle.
//! 2. **Rollover path** -- the snapshot's discriminator is unknown: archive
//!    the live store, raise the gate, and try the refresh right away. The
//!    snapshot that triggered the rollover is not decoded.
//! 3. **Decode path** -- decode every line against the installed mapping and
//!    upsert the results in order.
//!
//! Every failure is logged and ends the cycle early with the state as it was
//! before the failed step. Nothing here returns an error to the scheduler.

use tracing::{debug, info, warn};

use crate::cycle::{CycleGuard, GuardVerdict};
use crate::decoder::{LineDiagnostic, decode_snapshot};
use crate::feed::FeedSource;
use crate::mapping::MappingStore;
use crate::refresh::RefreshCoordinator;
use crate::store::EventStore;

/// Pipeline-owned state.
#[derive(Debug, Clone)]
pub struct FeedState {
    /// The installed code dictionary.
    pub mappings: MappingStore,
    /// Live and archived events.
    pub events: EventStore,
    /// The refresh-pending gate.
    pub refresh: RefreshCoordinator,
    cycle: u64,
}

impl FeedState {
    /// Create the state for a fresh process.
    ///
    /// The store starts cleared and a refresh is requested, so the first
    /// cycle loads the dictionary before anything is decoded.
    pub fn new() -> Self {
        let mut events = EventStore::new();
        events.clear();
        let mut refresh = RefreshCoordinator::new();
        refresh.request();
        Self {
            mappings: MappingStore::new(),
            events,
            refresh,
            cycle: 0,
        }
    }

    /// Number of cycles started so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A pending refresh completed.
    Refreshed {
        /// Number of codes in the new mapping.
        mapping_size: usize,
    },
    /// A pending refresh failed; decoding stays suppressed.
    RefreshFailed {
        /// Why the refresh failed.
        reason: String,
    },
    /// The guard detected a rollover.
    RolloverDetected {
        /// The discriminator that did not resolve.
        discriminator: String,
        /// Live events moved to the archive.
        archived: usize,
        /// Whether the follow-up refresh succeeded within this cycle.
        refreshed: bool,
    },
    /// The snapshot was decoded and reconciled.
    Decoded {
        /// Events written to the live store.
        upserted: usize,
        /// Lines skipped with a diagnostic.
        skipped: usize,
    },
    /// The snapshot fetch failed; nothing changed.
    FetchFailed {
        /// Why the fetch failed.
        reason: String,
    },
}

impl CycleOutcome {
    /// Short label for logs and broadcasts.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Refreshed { .. } => "refreshed",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::RolloverDetected { .. } => "rollover",
            Self::Decoded { .. } => "decoded",
            Self::FetchFailed { .. } => "fetch_failed",
        }
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// 1-based cycle number.
    pub cycle: u64,
    /// What happened.
    pub outcome: CycleOutcome,
    /// Live events after the cycle.
    pub live_events: usize,
    /// Archived events after the cycle.
    pub archived_events: usize,
    /// Whether decoding is suppressed going into the next cycle.
    pub refresh_pending: bool,
    /// Lines skipped during decoding.
    pub diagnostics: Vec<LineDiagnostic>,
}

/// Run one poll cycle against the feed.
pub async fn run_cycle<F: FeedSource>(state: &mut FeedState, feed: &mut F) -> CycleSummary {
    state.cycle = state.cycle.saturating_add(1);
    let mut diagnostics = Vec::new();

    let outcome = if state.refresh.is_pending() {
        refresh_path(state, feed).await
    } else {
        match feed.fetch_snapshot().await {
            Ok(raw) => {
                let mapping = state.mappings.current();
                match CycleGuard::check(&raw, &mapping) {
                    GuardVerdict::Rollover { discriminator } => {
                        rollover_path(state, feed, discriminator).await
                    }
                    GuardVerdict::Valid | GuardVerdict::Indeterminate => {
                        let report = decode_snapshot(&raw, &mapping);
                        let upserted = report.events.len();
                        for event in report.events {
                            state.events.upsert(event);
                        }
                        for diagnostic in &report.diagnostics {
                            warn!(
                                cycle = state.cycle,
                                line = diagnostic.line,
                                event_id = diagnostic.event_id.as_deref().unwrap_or(""),
                                error = %diagnostic.error,
                                "Skipped snapshot line"
                            );
                        }
                        diagnostics = report.diagnostics;
                        CycleOutcome::Decoded {
                            upserted,
                            skipped: diagnostics.len(),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(cycle = state.cycle, error = %e, "Snapshot fetch failed, cycle skipped");
                CycleOutcome::FetchFailed {
                    reason: e.to_string(),
                }
            }
        }
    };

    let summary = CycleSummary {
        cycle: state.cycle,
        outcome,
        live_events: state.events.live_len(),
        archived_events: state.events.archive_len(),
        refresh_pending: state.refresh.is_pending(),
        diagnostics,
    };

    debug!(
        cycle = summary.cycle,
        outcome = summary.outcome.label(),
        live_events = summary.live_events,
        archived_events = summary.archived_events,
        refresh_pending = summary.refresh_pending,
        "Cycle complete"
    );

    summary
}

async fn refresh_path<F: FeedSource>(state: &mut FeedState, feed: &mut F) -> CycleOutcome {
    match state.refresh.refresh(feed, &mut state.mappings).await {
        Ok(mapping_size) => CycleOutcome::Refreshed { mapping_size },
        Err(e) => CycleOutcome::RefreshFailed {
            reason: e.to_string(),
        },
    }
}

async fn rollover_path<F: FeedSource>(
    state: &mut FeedState,
    feed: &mut F,
    discriminator: String,
) -> CycleOutcome {
    info!(
        cycle = state.cycle,
        discriminator = discriminator.as_str(),
        "Discriminator not in mapping, dictionary rolled over"
    );
    let archived = state.refresh.begin_rollover(&mut state.events);
    let refreshed = state
        .refresh
        .refresh(feed, &mut state.mappings)
        .await
        .is_ok();

    CycleOutcome::RolloverDetected {
        discriminator,
        archived,
        refreshed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scorefeed_types::EventStatus;

    use super::*;
    use crate::feed::{FeedError, StaticFeed};

    const MAPPING: &str = "s1:FOOTBALL;h1:Real Madrid;a1:Barcelona;ACTIVE:LIVE;id1:CURRENT;id2:PERIOD_1";
    const SNAPSHOT: &str = "e1,s1,c1,1617184800000,h1,a1,ACTIVE,id1@1:2|id2@3:4\ne2,s1,c1,1617184800000,a1,h1,ACTIVE";

    #[tokio::test]
    async fn first_cycle_loads_mapping_without_decoding() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_mapping(MAPPING).with_snapshot(SNAPSHOT);

        let summary = run_cycle(&mut state, &mut feed).await;

        assert_eq!(summary.outcome, CycleOutcome::Refreshed { mapping_size: 6 });
        assert_eq!(feed.snapshot_fetches(), 0);
        assert!(state.events.is_empty());
        assert!(!summary.refresh_pending);
    }

    #[tokio::test]
    async fn second_cycle_decodes_and_upserts() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_mapping(MAPPING).with_snapshot(SNAPSHOT);

        run_cycle(&mut state, &mut feed).await;
        let summary = run_cycle(&mut state, &mut feed).await;

        assert_eq!(summary.outcome, CycleOutcome::Decoded { upserted: 2, skipped: 0 });
        assert_eq!(summary.live_events, 2);
        let e1 = state.events.get("e1").unwrap();
        assert_eq!(e1.status.as_str(), "LIVE");
        assert_eq!(e1.current_score().unwrap().away, "2");
    }

    #[tokio::test]
    async fn failed_refresh_suppresses_decoding_until_it_succeeds() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_snapshot(SNAPSHOT);
        feed.push_mapping(Err(FeedError::Status {
            status: 503,
            body: String::new(),
        }));
        feed.push_mapping(Ok(MAPPING.to_owned()));

        let first = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(first.outcome, CycleOutcome::RefreshFailed { .. }));
        assert!(first.refresh_pending);

        let second = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(second.outcome, CycleOutcome::Refreshed { .. }));
        assert_eq!(feed.snapshot_fetches(), 0);

        let third = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(third.outcome, CycleOutcome::Decoded { upserted: 2, .. }));
    }

    #[tokio::test]
    async fn snapshot_fetch_failure_leaves_state_unchanged() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_mapping(MAPPING).with_snapshot(SNAPSHOT);
        run_cycle(&mut state, &mut feed).await;
        run_cycle(&mut state, &mut feed).await;
        let before = state.events.snapshot();

        feed.push_snapshot(Err(FeedError::Transport("reset".to_owned())));
        let summary = run_cycle(&mut state, &mut feed).await;

        assert!(matches!(summary.outcome, CycleOutcome::FetchFailed { .. }));
        assert_eq!(state.events.snapshot(), before);
    }

    #[tokio::test]
    async fn rollover_archives_and_refreshes_in_one_cycle() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping(MAPPING)
            .with_mapping("s7:FOOTBALL;h7:Ajax;a7:PSV;ACTIVE:LIVE;id7:CURRENT")
            .with_snapshot(SNAPSHOT)
            .with_snapshot("e1,s7,c1,0,h7,a7,ACTIVE,id7@0:0|id7@1:0");

        run_cycle(&mut state, &mut feed).await;
        run_cycle(&mut state, &mut feed).await;
        let summary = run_cycle(&mut state, &mut feed).await;

        assert_eq!(
            summary.outcome,
            CycleOutcome::RolloverDetected {
                discriminator: "s7".to_owned(),
                archived: 2,
                refreshed: true,
            }
        );
        assert_eq!(summary.live_events, 0);
        assert_eq!(state.events.get_archived("e1").unwrap().status, EventStatus::Removed);

        // The next cycle decodes the new-cycle snapshot under the new mapping.
        let next = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(next.outcome, CycleOutcome::Decoded { upserted: 1, .. }));
        assert_eq!(state.events.get("e1").unwrap().competitors.home, "Ajax");
        // The archived copy is untouched by the new live record.
        assert_eq!(state.events.get_archived("e1").unwrap().competitors.home, "Real Madrid");
    }

    #[tokio::test]
    async fn rollover_with_failed_refresh_retries_next_cycle() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping(MAPPING)
            .with_snapshot(SNAPSHOT)
            .with_snapshot("e1,s7,c1,0,h7,a7,ACTIVE");
        feed.push_mapping(Err(FeedError::Transport("timeout".to_owned())));
        feed.push_mapping(Ok("s7:FOOTBALL".to_owned()));

        run_cycle(&mut state, &mut feed).await;
        run_cycle(&mut state, &mut feed).await;
        let rollover = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(
            rollover.outcome,
            CycleOutcome::RolloverDetected { refreshed: false, .. }
        ));
        assert!(rollover.refresh_pending);

        let snapshot_fetches = feed.snapshot_fetches();
        let retry = run_cycle(&mut state, &mut feed).await;
        assert!(matches!(retry.outcome, CycleOutcome::Refreshed { mapping_size: 1 }));
        assert_eq!(feed.snapshot_fetches(), snapshot_fetches);
    }

    #[tokio::test]
    async fn bad_lines_are_skipped_not_fatal() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new()
            .with_mapping(MAPPING)
            .with_snapshot("e1,s1,c1,0,h1,a1,ACTIVE,id1@1:2|zz@3:4\ne2,s1,c1,0,h1,a1,ACTIVE");

        run_cycle(&mut state, &mut feed).await;
        let summary = run_cycle(&mut state, &mut feed).await;

        assert_eq!(summary.outcome, CycleOutcome::Decoded { upserted: 1, skipped: 1 });
        assert_eq!(summary.diagnostics.len(), 1);
        assert!(state.events.get("e1").is_none());
        assert!(state.events.get("e2").is_some());
    }

    #[tokio::test]
    async fn unchanged_snapshot_is_idempotent() {
        let mut state = FeedState::new();
        let mut feed = StaticFeed::new().with_mapping(MAPPING).with_snapshot(SNAPSHOT);

        run_cycle(&mut state, &mut feed).await;
        run_cycle(&mut state, &mut feed).await;
        let first = serde_json::to_vec(&state.events.get_all()).unwrap();

        run_cycle(&mut state, &mut feed).await;
        let second = serde_json::to_vec(&state.events.get_all()).unwrap();

        assert_eq!(first, second);
        assert_eq!(state.events.live_len(), 2);
    }
}
