//! Observer server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds the listen address up front, so a port clash
//! fails startup instead of surfacing later on a background task, then
//! serves on a spawned Tokio task alongside the poll loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A running Observer server.
#[derive(Debug)]
pub struct ObserverHandle {
    /// The address actually bound (useful when port 0 was requested).
    pub addr: SocketAddr,
    /// The background serving task.
    pub task: JoinHandle<()>,
}

/// Bind the Observer server and serve it on a background task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<ObserverHandle, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let task = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(ObserverHandle { addr, task })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_on_ephemeral_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };
        let handle = spawn_observer(&config, Arc::new(AppState::new())).await.unwrap();
        assert_ne!(handle.addr.port(), 0);
        handle.task.abort();
    }

    #[tokio::test]
    async fn port_clash_fails_eagerly() {
        let first = spawn_observer(
            &ServerConfig {
                host: "127.0.0.1".to_owned(),
                port: 0,
            },
            Arc::new(AppState::new()),
        )
        .await
        .unwrap();

        let clash = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: first.addr.port(),
        };
        let result = spawn_observer(&clash, Arc::new(AppState::new())).await;
        assert!(matches!(result, Err(StartupError::Server(ServerError::Bind(_)))));
        first.task.abort();
    }
}
