//! Core entity structs for the Scorefeed event mirror.
//!
//! These are the semantic, fully resolved records that consumers see. None
//! of them carries an upstream code; every string has already been passed
//! through the current [`Mapping`](crate::Mapping).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EventStatus;

// ---------------------------------------------------------------------------
// Competitors
// ---------------------------------------------------------------------------

/// The two sides of a fixture, by resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Competitors {
    /// Home side.
    pub home: String,
    /// Away side.
    pub away: String,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// One score line taken from the odds segment of a feed line.
///
/// Values are carried exactly as the feed sends them; no numeric parsing
/// happens anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Score {
    /// The resolved semantic tag of the entry (starts with `CURRENT`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Home score as sent upstream.
    pub home: String,
    /// Away score as sent upstream.
    pub away: String,
}

/// Scores attached to an event. Only the current score is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Scores {
    /// The running score.
    #[serde(rename = "CURRENT")]
    pub current: Score,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A decoded sporting event.
///
/// Identity is the upstream `id`, which stays stable across snapshots until
/// a dictionary rollover archives the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Stable upstream identifier.
    pub id: String,
    /// Lifecycle status.
    #[ts(as = "String")]
    pub status: EventStatus,
    /// Kick-off time.
    pub start_time: DateTime<Utc>,
    /// Resolved sport name.
    pub sport: String,
    /// Resolved competition name.
    pub competition: String,
    /// Home and away sides.
    pub competitors: Competitors,
    /// Current score, when the feed line carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
}

impl Event {
    /// Consume the event and return it marked as [`EventStatus::Removed`].
    #[must_use]
    pub fn into_removed(self) -> Self {
        Self {
            status: EventStatus::Removed,
            ..self
        }
    }

    /// The current score, if any.
    pub fn current_score(&self) -> Option<&Score> {
        self.scores.as_ref().map(|s| &s.current)
    }
}
