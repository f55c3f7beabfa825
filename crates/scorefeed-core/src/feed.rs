//! Feed source trait and a scripted in-memory implementation.
//!
//! The pipeline pulls two documents from the upstream: the code dictionary
//! and the encoded snapshot. The [`FeedSource`] trait abstracts how they are
//! obtained. The engine binary provides an HTTP implementation; tests use
//! [`StaticFeed`].
//!
//! Both fetches return the raw payload string (the value of the `mappings`
//! or `odds` field); unwrapping the transport envelope is the source's job.

use std::collections::VecDeque;
use std::future::Future;

/// Errors at the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response body was not the expected JSON document.
    #[error("invalid response body: {0}")]
    Body(String),

    /// The source has nothing to return.
    #[error("feed unavailable: {0}")]
    Unavailable(String),
}

/// A source of raw upstream documents.
pub trait FeedSource {
    /// Fetch the raw `code:tag;...` dictionary string.
    fn fetch_mappings(&mut self) -> impl Future<Output = Result<String, FeedError>> + Send;

    /// Fetch the raw newline-separated snapshot string.
    fn fetch_snapshot(&mut self) -> impl Future<Output = Result<String, FeedError>> + Send;
}

/// A feed that replays scripted responses in order.
///
/// Each fetch pops the next queued response for its kind. When a queue runs
/// dry the last successful response is served again, so a test can script
/// "the same snapshot forever" with a single push. If nothing was ever
/// queued, the fetch fails with [`FeedError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    mappings: VecDeque<Result<String, FeedError>>,
    snapshots: VecDeque<Result<String, FeedError>>,
    last_mapping: Option<String>,
    last_snapshot: Option<String>,
    mapping_fetches: u64,
    snapshot_fetches: u64,
}

impl StaticFeed {
    /// Create a feed with empty scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a mapping response.
    #[must_use]
    pub fn with_mapping(mut self, raw: impl Into<String>) -> Self {
        self.push_mapping(Ok(raw.into()));
        self
    }

    /// Queue a snapshot response.
    #[must_use]
    pub fn with_snapshot(mut self, raw: impl Into<String>) -> Self {
        self.push_snapshot(Ok(raw.into()));
        self
    }

    /// Queue a mapping response or failure.
    pub fn push_mapping(&mut self, response: Result<String, FeedError>) {
        self.mappings.push_back(response);
    }

    /// Queue a snapshot response or failure.
    pub fn push_snapshot(&mut self, response: Result<String, FeedError>) {
        self.snapshots.push_back(response);
    }

    /// Number of mapping fetches served so far.
    pub const fn mapping_fetches(&self) -> u64 {
        self.mapping_fetches
    }

    /// Number of snapshot fetches served so far.
    pub const fn snapshot_fetches(&self) -> u64 {
        self.snapshot_fetches
    }
}

fn next_response(
    queue: &mut VecDeque<Result<String, FeedError>>,
    last: &mut Option<String>,
    kind: &str,
) -> Result<String, FeedError> {
    match queue.pop_front() {
        Some(Ok(raw)) => {
            *last = Some(raw.clone());
            Ok(raw)
        }
        Some(Err(e)) => Err(e),
        None => last
            .clone()
            .ok_or_else(|| FeedError::Unavailable(format!("no {kind} scripted"))),
    }
}

impl FeedSource for StaticFeed {
    async fn fetch_mappings(&mut self) -> Result<String, FeedError> {
        self.mapping_fetches = self.mapping_fetches.saturating_add(1);
        next_response(&mut self.mappings, &mut self.last_mapping, "mapping")
    }

    async fn fetch_snapshot(&mut self) -> Result<String, FeedError> {
        self.snapshot_fetches = self.snapshot_fetches.saturating_add(1);
        next_response(&mut self.snapshots, &mut self.last_snapshot, "snapshot")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_repeats_last() {
        let mut feed = StaticFeed::new()
            .with_snapshot("first")
            .with_snapshot("second");

        assert_eq!(feed.fetch_snapshot().await.unwrap(), "first");
        assert_eq!(feed.fetch_snapshot().await.unwrap(), "second");
        assert_eq!(feed.fetch_snapshot().await.unwrap(), "second");
        assert_eq!(feed.snapshot_fetches(), 3);
    }

    #[tokio::test]
    async fn unscripted_fetch_is_unavailable() {
        let mut feed = StaticFeed::new();
        let err = feed.fetch_mappings().await.unwrap_err();
        assert!(matches!(err, FeedError::Unavailable(_)));
    }

    #[tokio::test]
    async fn scripted_failure_is_returned_once() {
        let mut feed = StaticFeed::new().with_mapping("a:1");
        feed.push_mapping(Err(FeedError::Transport("reset".to_owned())));

        assert_eq!(feed.fetch_mappings().await.unwrap(), "a:1");
        assert!(feed.fetch_mappings().await.is_err());
        assert_eq!(feed.fetch_mappings().await.unwrap(), "a:1");
    }
}
