//! HTTP implementation of [`FeedSource`] over `reqwest`.
//!
//! The upstream serves two JSON documents:
//!
//! - `GET {base_url}{mappings_path}` returns `{ "mappings": "<code:tag;...>" }`
//! - `GET {base_url}{state_path}` returns `{ "odds": "<line\nline...>" }`
//!
//! Any transport failure, non-2xx status, or body that does not match these
//! shapes is a [`FeedError`]. The pipeline treats all of them the same way:
//! skip the cycle and leave the state alone.

use reqwest::Client;
use scorefeed_core::config::FeedConfig;
use scorefeed_core::feed::{FeedError, FeedSource};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct MappingsBody {
    mappings: String,
}

#[derive(Debug, Deserialize)]
struct StateBody {
    odds: String,
}

/// Upstream feed client.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    mappings_url: String,
    state_url: String,
}

impl HttpFeed {
    /// Build a client for the configured upstream.
    ///
    /// Every request is bounded by `request_timeout_ms`.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FeedError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            mappings_url: config.mappings_url(),
            state_url: config.state_url(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("unable to read error body: {e}"));
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json()
            .await
            .map_err(|e| FeedError::Body(format!("GET {url}: {e}")))?;
        debug!(url, "Upstream document fetched");
        Ok(parsed)
    }
}

impl FeedSource for HttpFeed {
    async fn fetch_mappings(&mut self) -> Result<String, FeedError> {
        let body: MappingsBody = self.get_json(&self.mappings_url).await?;
        Ok(body.mappings)
    }

    async fn fetch_snapshot(&mut self) -> Result<String, FeedError> {
        let body: StateBody = self.get_json(&self.state_url).await?;
        Ok(body.odds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    use super::*;

    async fn upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn feed_for(base_url: String) -> HttpFeed {
        HttpFeed::new(&FeedConfig {
            base_url,
            ..FeedConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_both_documents() {
        let router = Router::new()
            .route(
                "/api/mappings",
                get(|| async { axum::Json(serde_json::json!({ "mappings": "s1:FOOTBALL;id1:CURRENT" })) }),
            )
            .route(
                "/api/state",
                get(|| async { axum::Json(serde_json::json!({ "odds": "e1,s1,c1,0,h1,a1,ACTIVE" })) }),
            );
        let mut feed = feed_for(upstream(router).await);

        assert_eq!(feed.fetch_mappings().await.unwrap(), "s1:FOOTBALL;id1:CURRENT");
        assert_eq!(feed.fetch_snapshot().await.unwrap(), "e1,s1,c1,0,h1,a1,ACTIVE");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/state",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let mut feed = feed_for(upstream(router).await);

        let err = feed.fetch_snapshot().await.unwrap_err();
        assert_eq!(
            err,
            FeedError::Status {
                status: 503,
                body: "maintenance".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn wrong_shape_is_a_body_error() {
        let router = Router::new().route(
            "/api/mappings",
            get(|| async { axum::Json(serde_json::json!({ "unexpected": 1 })) }),
        );
        let mut feed = feed_for(upstream(router).await);

        assert!(matches!(feed.fetch_mappings().await, Err(FeedError::Body(_))));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // Bind then drop to get a port nobody is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut feed = feed_for(format!("http://{addr}"));

        assert!(matches!(feed.fetch_mappings().await, Err(FeedError::Transport(_))));
    }

    #[test]
    fn urls_come_from_config() {
        let feed = feed_for("http://upstream:3000/".to_owned());
        assert_eq!(feed.mappings_url, "http://upstream:3000/api/mappings");
        assert_eq!(feed.state_url, "http://upstream:3000/api/state");
    }
}
