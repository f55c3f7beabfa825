//! Event store: live events plus the archive of superseded ones.
//!
//! Both maps are keyed by event id. Writes are whole-record replacements;
//! nothing in here merges fields. Reads hand out clones so callers can never
//! reach into the store's own records.
//!
//! The archive only grows or replaces. The sole way to drop archived events
//! is [`EventStore::clear`], which is reserved for process start.

use std::collections::BTreeMap;

use scorefeed_types::Event;

/// Owned copy of the full store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Live events by id.
    pub live: BTreeMap<String, Event>,
    /// Archived events by id.
    pub archive: BTreeMap<String, Event>,
}

/// Live and archived events keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    live: BTreeMap<String, Event>,
    archive: BTreeMap<String, Event>,
}

impl EventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event, fully replacing any live event with the same id.
    ///
    /// Returns the record that was replaced.
    pub fn upsert(&mut self, event: Event) -> Option<Event> {
        self.live.insert(event.id.clone(), event)
    }

    /// A copy of the live event with this id.
    pub fn get(&self, id: &str) -> Option<Event> {
        self.live.get(id).cloned()
    }

    /// Copies of all live events, in id order.
    pub fn get_all(&self) -> Vec<Event> {
        self.live.values().cloned().collect()
    }

    /// A copy of the archived event with this id.
    pub fn get_archived(&self, id: &str) -> Option<Event> {
        self.archive.get(id).cloned()
    }

    /// Copies of all archived events, in id order.
    pub fn archived(&self) -> Vec<Event> {
        self.archive.values().cloned().collect()
    }

    /// Move events into the archive, replacing existing entries by id.
    ///
    /// Returns how many events were written.
    pub fn archive<I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = Event>,
    {
        let mut written: usize = 0;
        for event in events {
            self.archive.insert(event.id.clone(), event);
            written = written.saturating_add(1);
        }
        written
    }

    /// Remove and return every live event, leaving the archive untouched.
    pub fn take_live(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.live).into_values().collect()
    }

    /// Empty both the live map and the archive.
    pub fn clear(&mut self) {
        self.live.clear();
        self.archive.clear();
    }

    /// Number of live events.
    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Number of archived events.
    pub fn archive_len(&self) -> usize {
        self.archive.len()
    }

    /// Whether there are no live events.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Copy out the full contents of both maps.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            live: self.live.clone(),
            archive: self.archive.clone(),
        }
    }
}
