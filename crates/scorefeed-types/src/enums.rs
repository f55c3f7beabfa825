//! Enumeration types for the Scorefeed event mirror.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event status
// ---------------------------------------------------------------------------

/// Lifecycle status of a sporting event.
///
/// The status is taken from the resolved semantic tag of the feed's status
/// field. The three labels the mirror itself reasons about get dedicated
/// variants; any other label the upstream uses (for example `LIVE`) is kept
/// verbatim in [`EventStatus::Other`] so nothing is lost in translation.
///
/// Serializes as the plain tag string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    /// The event is in progress or scheduled.
    Active,
    /// The event has finished.
    Completed,
    /// The event was superseded by a dictionary rollover and archived.
    Removed,
    /// Any other upstream status label, kept as-is.
    Other(String),
}

impl EventStatus {
    /// Build a status from a resolved semantic tag.
    pub fn from_tag(tag: &str) -> Self {
        Self::known(tag).unwrap_or_else(|| Self::Other(tag.to_owned()))
    }

    fn known(tag: &str) -> Option<Self> {
        match tag {
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "REMOVED" => Some(Self::Removed),
            _ => None,
        }
    }

    /// The tag string this status serializes to.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Removed => "REMOVED",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EventStatus {
    fn from(tag: String) -> Self {
        Self::known(&tag).unwrap_or_else(|| Self::Other(tag))
    }
}

impl From<EventStatus> for String {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_map_to_variants() {
        assert_eq!(EventStatus::from_tag("ACTIVE"), EventStatus::Active);
        assert_eq!(EventStatus::from_tag("COMPLETED"), EventStatus::Completed);
        assert_eq!(EventStatus::from_tag("REMOVED"), EventStatus::Removed);
    }

    #[test]
    fn unknown_tag_is_kept_verbatim() {
        let status = EventStatus::from_tag("LIVE");
        assert_eq!(status, EventStatus::Other("LIVE".to_owned()));
        assert_eq!(status.as_str(), "LIVE");
    }

    #[test]
    fn tag_and_string_conversions_agree() {
        for tag in ["ACTIVE", "COMPLETED", "REMOVED", "LIVE", ""] {
            assert_eq!(EventStatus::from_tag(tag), EventStatus::from(tag.to_owned()));
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&EventStatus::Removed).unwrap();
        assert_eq!(json, "\"REMOVED\"");

        let back: EventStatus = serde_json::from_str("\"PRE_MATCH\"").unwrap();
        assert_eq!(back, EventStatus::Other("PRE_MATCH".to_owned()));
    }
}
