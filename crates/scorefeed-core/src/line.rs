//! Field-level parser for one snapshot line.
//!
//! A snapshot line is a comma-separated record with a fixed positional
//! layout:
//!
//! | Index | Field | Resolved through mapping |
//! |-------|-------|--------------------------|
//! | 0 | event id | no |
//! | 1 | sport code | yes |
//! | 2 | competition code | yes |
//! | 3 | start time (ms since epoch) | no |
//! | 4 | home competitor code | yes |
//! | 5 | away competitor code | yes |
//! | 6 | status code | yes |
//! | 7.. | optional odds segment (last field) | per entry |
//!
//! [`FeedLine::parse`] turns that layout into named fields. It does no
//! dictionary work; that happens in [`crate::decoder`].

use crate::decoder::DecodeError;

/// Field separator within a line.
pub const FIELD_SEPARATOR: char = ',';

/// Separator between odds entries in the odds segment.
pub const ENTRY_SEPARATOR: char = '|';

/// Separator between an entry code and its payload.
pub const PAYLOAD_SEPARATOR: char = '@';

/// Position of the per-cycle discriminator field (the sport code).
const DISCRIMINATOR_INDEX: usize = 1;

/// A snapshot line split into its named fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLine<'a> {
    /// Event id, used verbatim.
    pub id: &'a str,
    /// Sport code.
    pub sport_code: &'a str,
    /// Competition code.
    pub competition_code: &'a str,
    /// Start time in milliseconds since the Unix epoch.
    pub start_time_millis: i64,
    /// Home competitor code.
    pub home_code: &'a str,
    /// Away competitor code.
    pub away_code: &'a str,
    /// Status code.
    pub status_code: &'a str,
    /// Raw odds segment, present when the last field past the status holds
    /// both `@` and `|`.
    pub odds_segment: Option<&'a str>,
}

impl<'a> FeedLine<'a> {
    /// Split a raw line into named fields.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingField`] when the line has fewer than
    /// seven fields and [`DecodeError::InvalidStartTime`] when field 3 is
    /// not an integer.
    pub fn parse(line: &'a str) -> Result<Self, DecodeError> {
        let mut fields = line.split(FIELD_SEPARATOR);

        let id = next_field(&mut fields, 0, "id")?;
        let sport_code = next_field(&mut fields, 1, "sport")?;
        let competition_code = next_field(&mut fields, 2, "competition")?;
        let start_time_raw = next_field(&mut fields, 3, "start time")?;
        let home_code = next_field(&mut fields, 4, "home competitor")?;
        let away_code = next_field(&mut fields, 5, "away competitor")?;
        let status_code = next_field(&mut fields, 6, "status")?;

        let start_time_millis =
            start_time_raw
                .trim()
                .parse::<i64>()
                .map_err(|e| DecodeError::InvalidStartTime {
                    value: start_time_raw.to_owned(),
                    reason: e.to_string(),
                })?;

        let odds_segment = fields.next_back().filter(|field| is_odds_segment(field));

        Ok(Self {
            id,
            sport_code,
            competition_code,
            start_time_millis,
            home_code,
            away_code,
            status_code,
            odds_segment,
        })
    }
}

/// Whether a field is shaped like an odds segment.
pub fn is_odds_segment(field: &str) -> bool {
    field.contains(PAYLOAD_SEPARATOR) && field.contains(ENTRY_SEPARATOR)
}

/// The per-cycle discriminator of a line (field 1), if the line has one.
pub fn discriminator(line: &str) -> Option<&str> {
    line.split(FIELD_SEPARATOR).nth(DISCRIMINATOR_INDEX)
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    index: usize,
    name: &'static str,
) -> Result<&'a str, DecodeError> {
    fields
        .next()
        .ok_or(DecodeError::MissingField { index, name })
}
