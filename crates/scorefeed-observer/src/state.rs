//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for cycle summaries and a copy
//! of the pipeline state that the REST endpoints serve. The pipeline never
//! shares its own state: after every cycle the engine replaces the copy
//! here, so a reader only ever sees whole-cycle results.

use std::collections::BTreeMap;
use std::sync::Arc;

use scorefeed_core::control::PollControl;
use scorefeed_core::pipeline::{CycleOutcome, CycleSummary, FeedState};
use scorefeed_types::{Event, Mapping};
use tokio::sync::{RwLock, broadcast};

/// Capacity of the broadcast channel for cycle summaries.
///
/// A subscriber that falls further behind than this receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest message.
const BROADCAST_CAPACITY: usize = 256;

/// A snapshot line the decoder skipped, as reported to stream clients.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkippedLine {
    /// 1-based line number within the snapshot.
    pub line: usize,
    /// Event id of the line, when it had one.
    pub event_id: Option<String>,
    /// Decoder error text.
    pub reason: String,
}

/// JSON-serializable cycle summary pushed over the `WebSocket`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CycleBroadcast {
    /// The cycle number.
    pub cycle: u64,
    /// Outcome label (`decoded`, `rollover`, ...).
    pub outcome: String,
    /// Sport code that triggered a rollover this cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollover_discriminator: Option<String>,
    /// Live events after the cycle.
    pub live_events: usize,
    /// Archived events after the cycle.
    pub archived_events: usize,
    /// Whether decoding is suppressed pending a mapping refresh.
    pub refresh_pending: bool,
    /// Lines skipped during decoding.
    pub skipped: Vec<SkippedLine>,
}

impl CycleBroadcast {
    /// Project a core cycle summary.
    pub fn from_summary(summary: &CycleSummary) -> Self {
        let rollover_discriminator =
            if let CycleOutcome::RolloverDetected { discriminator, .. } = &summary.outcome {
                Some(discriminator.clone())
            } else {
                None
            };
        Self {
            cycle: summary.cycle,
            outcome: summary.outcome.label().to_owned(),
            rollover_discriminator,
            live_events: summary.live_events,
            archived_events: summary.archived_events,
            refresh_pending: summary.refresh_pending,
            skipped: summary
                .diagnostics
                .iter()
                .map(|d| SkippedLine {
                    line: d.line,
                    event_id: d.event_id.clone(),
                    reason: d.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Copy of the pipeline state served by the REST endpoints.
///
/// Serialized as-is by `GET /state`, whose downstream key names are fixed:
/// `mappings`, `state`, `archivedEvents`, `shouldFetchNewCycleMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FeedView {
    /// The installed mapping.
    pub mappings: Mapping,
    /// Live events by id.
    #[serde(rename = "state")]
    pub live: BTreeMap<String, Event>,
    /// Archived events by id.
    #[serde(rename = "archivedEvents")]
    pub archive: BTreeMap<String, Event>,
    /// Whether decoding is suppressed pending a mapping refresh.
    #[serde(rename = "shouldFetchNewCycleMap")]
    pub refresh_pending: bool,
    /// Cycles run so far.
    pub cycle: u64,
}

impl FeedView {
    /// Copy everything a reader can see out of the pipeline state.
    pub fn capture(state: &FeedState) -> Self {
        let store = state.events.snapshot();
        Self {
            mappings: state.mappings.mapping().clone(),
            live: store.live,
            archive: store.archive,
            refresh_pending: state.refresh.is_pending(),
            cycle: state.cycle(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for cycle summary messages.
    pub tx: broadcast::Sender<CycleBroadcast>,
    /// The latest copy of the pipeline state.
    pub snapshot: Arc<RwLock<FeedView>>,
    /// Shared poll controls (present when the poller is running).
    pub control: Option<Arc<PollControl>>,
}

impl AppState {
    /// Create a new application state with an empty view.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(FeedView::default())),
            control: None,
        }
    }

    /// Create a new application state with poll controls attached.
    pub fn with_control(control: Arc<PollControl>) -> Self {
        Self {
            control: Some(control),
            ..Self::new()
        }
    }

    /// Subscribe to the cycle broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a cycle summary to all connected clients.
    ///
    /// Returns the number of receivers reached; 0 when nobody is listening.
    pub fn broadcast(&self, summary: &CycleBroadcast) -> usize {
        // send only fails when there are no receivers.
        self.tx.send(summary.clone()).unwrap_or(0)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
