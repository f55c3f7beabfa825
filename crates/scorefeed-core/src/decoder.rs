//! Feed decoder: raw snapshot lines to semantic [`Event`] records.
//!
//! Decoding is a pure function of `(line, mapping)`. Each line is decoded on
//! its own, and [`decode_snapshot`] keeps the input order in its output.
//!
//! # Failure policy
//!
//! Plain fields never fail to resolve: an unknown code passes through as-is.
//! Odds entries are stricter, because an entry whose code is not in the
//! dictionary cannot be classified as current or not. Such an entry fails its
//! line. [`decode_snapshot`] skips failed lines, records a
//! [`LineDiagnostic`] for each, and keeps decoding the rest of the snapshot.
//!
//! Only entries whose tag starts with [`CURRENT_TAG_PREFIX`] end up on the
//! event. Period and other entries are parsed and validated, then dropped.

use chrono::DateTime;
use scorefeed_types::{Competitors, Event, EventStatus, Mapping, Score, Scores};

use crate::line::{ENTRY_SEPARATOR, FeedLine, PAYLOAD_SEPARATOR};

/// Tag prefix of odds entries that carry the running score.
pub const CURRENT_TAG_PREFIX: &str = "CURRENT";

/// Separator between the home and away halves of a score payload.
const SCORE_SEPARATOR: char = ':';

/// Errors that fail the decode of a single line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The line ended before a required positional field.
    #[error("missing field {index} ({name})")]
    MissingField {
        /// Zero-based field position.
        index: usize,
        /// Human-readable field name.
        name: &'static str,
    },

    /// The start time field is not a millisecond timestamp.
    #[error("invalid start time {value:?}: {reason}")]
    InvalidStartTime {
        /// The raw field value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An odds entry had no `@` between code and payload.
    #[error("odds entry {entry:?} has no '@' separator")]
    MalformedOddsEntry {
        /// The raw entry text.
        entry: String,
    },

    /// An odds entry code is not in the current dictionary.
    #[error("odds entry code {code:?} is not in the current mapping")]
    UnresolvedOddsCode {
        /// The unresolved code.
        code: String,
    },

    /// A score payload had no `:` between home and away.
    #[error("score payload {payload:?} for {tag} has no ':' separator")]
    MalformedScore {
        /// Resolved tag of the entry.
        tag: String,
        /// The raw payload.
        payload: String,
    },
}

/// One decoded odds entry, before the current-score filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsEntry {
    /// Resolved semantic tag.
    pub tag: String,
    /// Home value as sent.
    pub home: String,
    /// Away value as sent.
    pub away: String,
}

impl OddsEntry {
    /// Whether this entry carries the running score.
    pub fn is_current(&self) -> bool {
        self.tag.starts_with(CURRENT_TAG_PREFIX)
    }

    fn into_score(self) -> Score {
        Score {
            kind: self.tag,
            home: self.home,
            away: self.away,
        }
    }
}

/// A line that was skipped while decoding a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiagnostic {
    /// 1-based line number within the snapshot.
    pub line: usize,
    /// Event id of the line, when the line had one.
    pub event_id: Option<String>,
    /// Why the line was skipped.
    pub error: DecodeError,
}

/// Outcome of decoding a whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Successfully decoded events, in input order.
    pub events: Vec<Event>,
    /// One entry per skipped line.
    pub diagnostics: Vec<LineDiagnostic>,
}

/// Decode one snapshot line against a dictionary.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the line is structurally malformed or an
/// odds entry cannot be decoded. See the module docs for the policy.
pub fn decode_line(line: &str, mapping: &Mapping) -> Result<Event, DecodeError> {
    let fields = FeedLine::parse(line)?;

    let start_time = DateTime::from_timestamp_millis(fields.start_time_millis).ok_or_else(|| {
        DecodeError::InvalidStartTime {
            value: fields.start_time_millis.to_string(),
            reason: "out of range".to_owned(),
        }
    })?;

    let scores = match fields.odds_segment {
        Some(segment) => current_score(decode_odds_segment(segment, mapping)?),
        None => None,
    };

    Ok(Event {
        id: fields.id.to_owned(),
        status: EventStatus::from_tag(mapping.resolve(fields.status_code)),
        start_time,
        sport: mapping.resolve(fields.sport_code).to_owned(),
        competition: mapping.resolve(fields.competition_code).to_owned(),
        competitors: Competitors {
            home: mapping.resolve(fields.home_code).to_owned(),
            away: mapping.resolve(fields.away_code).to_owned(),
        },
        scores,
    })
}

/// Decode every entry of an odds segment (`code@home:away|...`).
///
/// # Errors
///
/// Fails on the first entry that lacks `@`, whose code is not in the
/// dictionary, or whose payload lacks `:`.
pub fn decode_odds_segment(segment: &str, mapping: &Mapping) -> Result<Vec<OddsEntry>, DecodeError> {
    segment
        .split(ENTRY_SEPARATOR)
        .map(|entry| decode_odds_entry(entry, mapping))
        .collect()
}

fn decode_odds_entry(entry: &str, mapping: &Mapping) -> Result<OddsEntry, DecodeError> {
    let (code, payload) =
        entry
            .split_once(PAYLOAD_SEPARATOR)
            .ok_or_else(|| DecodeError::MalformedOddsEntry {
                entry: entry.to_owned(),
            })?;

    let tag = mapping
        .get(code)
        .ok_or_else(|| DecodeError::UnresolvedOddsCode {
            code: code.to_owned(),
        })?;

    // Only the first two parts count; anything after a second `:` is dropped.
    let mut parts = payload.split(SCORE_SEPARATOR);
    let (home, away) = parts
        .next()
        .zip(parts.next())
        .ok_or_else(|| DecodeError::MalformedScore {
            tag: tag.to_owned(),
            payload: payload.to_owned(),
        })?;

    Ok(OddsEntry {
        tag: tag.to_owned(),
        home: home.to_owned(),
        away: away.to_owned(),
    })
}

/// Keep the running score and drop every other entry.
///
/// When several entries qualify, the last one in the segment wins.
fn current_score(entries: Vec<OddsEntry>) -> Option<Scores> {
    entries
        .into_iter()
        .rev()
        .find(OddsEntry::is_current)
        .map(|entry| Scores {
            current: entry.into_score(),
        })
}

/// Decode a newline-separated snapshot.
///
/// Blank lines are ignored and a trailing `\r` is stripped from each line.
/// Failed lines are reported in [`DecodeReport::diagnostics`] and do not
/// stop the remaining lines from decoding.
pub fn decode_snapshot(raw: &str, mapping: &Mapping) -> DecodeReport {
    let mut report = DecodeReport::default();

    for (index, line) in snapshot_lines(raw) {
        match decode_line(line, mapping) {
            Ok(event) => report.events.push(event),
            Err(error) => report.diagnostics.push(LineDiagnostic {
                line: index,
                event_id: line
                    .split(crate::line::FIELD_SEPARATOR)
                    .next()
                    .filter(|id| !id.is_empty())
                    .map(ToOwned::to_owned),
                error,
            }),
        }
    }

    report
}

/// Non-blank lines of a snapshot paired with their 1-based line number.
pub(crate) fn snapshot_lines(raw: &str) -> impl Iterator<Item = (usize, &str)> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index.saturating_add(1), line))
}
