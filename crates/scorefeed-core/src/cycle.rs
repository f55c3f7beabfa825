//! Cycle guard: detects upstream dictionary rollovers.
//!
//! The upstream periodically reallocates its code namespace. After a
//! rollover the old dictionary would still "resolve" many codes, just to the
//! wrong tags, so decoding must stop until a fresh dictionary is loaded.
//!
//! The guard inspects one field before any line is decoded: the sport code
//! (field 1) of the first line. That code belongs to the current cycle's
//! dictionary; when it is missing from the installed mapping, the snapshot
//! was encoded against a newer dictionary.

use scorefeed_types::Mapping;

use crate::decoder::snapshot_lines;
use crate::line::discriminator;

/// What the guard concluded about a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// The discriminator is in the mapping; decoding is safe.
    Valid,
    /// The discriminator is not in the mapping; the dictionary has rolled over.
    Rollover {
        /// The discriminator code that failed to resolve.
        discriminator: String,
    },
    /// The snapshot has no line carrying a discriminator. There is nothing to
    /// check against, so decoding proceeds and reports per-line problems.
    Indeterminate,
}

/// Stateless rollover detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleGuard;

impl CycleGuard {
    /// Inspect a raw snapshot against the installed mapping.
    pub fn check(snapshot: &str, mapping: &Mapping) -> GuardVerdict {
        let Some((_, first_line)) = snapshot_lines(snapshot).next() else {
            return GuardVerdict::Indeterminate;
        };

        match discriminator(first_line) {
            Some(code) if mapping.contains(code) => GuardVerdict::Valid,
            Some(code) => GuardVerdict::Rollover {
                discriminator: code.to_owned(),
            },
            None => GuardVerdict::Indeterminate,
        }
    }

    /// Whether the mapping must be refreshed before decoding this snapshot.
    pub fn needs_refresh(snapshot: &str, mapping: &Mapping) -> bool {
        matches!(Self::check(snapshot, mapping), GuardVerdict::Rollover { .. })
    }
}
