//! Refresh coordinator: rollover handling and the refresh-pending gate.
//!
//! When the cycle guard reports a rollover, every live event is archived as
//! [`EventStatus::Removed`](scorefeed_types::EventStatus::Removed), the live
//! store is emptied, and the pending flag is raised. While the flag is up no
//! snapshot may be decoded. A successful mapping fetch and load installs the
//! new dictionary and lowers the flag; a failed one leaves it up so the next
//! trigger retries.

use scorefeed_types::{Event, Mapping};
use tracing::{info, warn};

use crate::feed::{FeedError, FeedSource};
use crate::mapping::{MappingError, MappingStore};
use crate::store::EventStore;

/// Errors from a refresh attempt. Both leave the flag raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The mapping could not be fetched.
    #[error("mapping fetch failed: {0}")]
    Fetch(#[from] FeedError),

    /// The fetched mapping could not be loaded.
    #[error("mapping load failed: {0}")]
    Load(#[from] MappingError),
}

/// Owner of the refresh-pending flag.
#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    pending: bool,
    rollovers: u64,
    refreshes: u64,
    failed_attempts: u64,
}

impl RefreshCoordinator {
    /// Create a coordinator with no refresh pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether decoding is currently suppressed.
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Raise the flag without archiving anything (used before the first load).
    pub fn request(&mut self) {
        self.pending = true;
    }

    /// React to a detected rollover.
    ///
    /// Archives every live event with status `REMOVED`, empties the live
    /// store, and raises the pending flag. Returns the number archived.
    pub fn begin_rollover(&mut self, store: &mut EventStore) -> usize {
        let removed = store.take_live().into_iter().map(Event::into_removed);
        let archived = store.archive(removed);

        self.pending = true;
        self.rollovers = self.rollovers.saturating_add(1);

        info!(
            archived,
            archive_total = store.archive_len(),
            "Rollover: live events archived, refresh pending"
        );
        archived
    }

    /// Fetch, load, and install a new mapping.
    ///
    /// On success the pending flag is lowered and the size of the new mapping
    /// returned. On failure nothing is installed and the flag stays up.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] if the fetch or the load fails.
    pub async fn refresh<F: FeedSource>(
        &mut self,
        feed: &mut F,
        mappings: &mut MappingStore,
    ) -> Result<usize, RefreshError> {
        match fetch_and_load(feed).await {
            Ok(mapping) => {
                let size = mapping.len();
                mappings.replace(mapping);
                self.pending = false;
                self.refreshes = self.refreshes.saturating_add(1);
                info!(mapping_size = size, generation = mappings.generation(), "Mapping refreshed");
                Ok(size)
            }
            Err(e) => {
                self.failed_attempts = self.failed_attempts.saturating_add(1);
                warn!(error = %e, failed_attempts = self.failed_attempts, "Mapping refresh failed, will retry");
                Err(e)
            }
        }
    }

    /// Number of rollovers handled.
    pub const fn rollovers(&self) -> u64 {
        self.rollovers
    }

    /// Number of successful refreshes.
    pub const fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// Number of failed refresh attempts.
    pub const fn failed_attempts(&self) -> u64 {
        self.failed_attempts
    }
}

async fn fetch_and_load<F: FeedSource>(
    feed: &mut F,
) -> Result<Mapping, RefreshError> {
    let raw = feed.fetch_mappings().await?;
    Ok(MappingStore::load(&raw)?)
}
