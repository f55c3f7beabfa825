//! `WebSocket` stream of poll cycles at `GET /ws/cycles`.
//!
//! A client first receives a `connected` frame describing the view as it
//! stands, then one `cycle` frame per completed poll cycle. Cycle frames
//! carry the rollover discriminator and every line the decoder skipped, so
//! a client can follow feed health without polling `/state`.
//!
//! A client that falls behind the broadcast buffer skips to the newest
//! cycle; the next frame's counters are always current.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, CycleBroadcast, FeedView};

/// One frame on the cycle stream, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    /// Sent once on connect.
    Connected {
        /// Cycles run so far.
        cycle: u64,
        /// Live events in the current view.
        live_events: usize,
        /// Archived events in the current view.
        archived_events: usize,
        /// Whether decoding is suppressed pending a mapping refresh.
        refresh_pending: bool,
    },
    /// A completed poll cycle.
    Cycle(CycleBroadcast),
}

impl StreamFrame {
    /// Greeting frame for the view a new client joins on.
    pub fn connected(view: &FeedView) -> Self {
        Self::Connected {
            cycle: view.cycle,
            live_events: view.live.len(),
            archived_events: view.archive.len(),
            refresh_pending: view.refresh_pending,
        }
    }
}

/// Upgrade to a `WebSocket` and stream cycle frames.
pub async fn ws_cycles(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_cycles(socket, state))
}

/// Serialize and send one frame. `false` means the client is gone.
async fn send_frame(socket: &mut WebSocket, frame: &StreamFrame) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize stream frame");
            true
        }
    }
}

async fn stream_cycles(mut socket: WebSocket, state: Arc<AppState>) {
    // Subscribe before reading the view so no cycle falls between the two.
    let mut rx = state.subscribe();
    let greeting = StreamFrame::connected(&*state.snapshot.read().await);
    if !send_frame(&mut socket, &greeting).await {
        return;
    }
    debug!("Cycle stream client connected");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(cycle) => {
                    if !send_frame(&mut socket, &StreamFrame::Cycle(cycle)).await {
                        debug!("Cycle stream client gone");
                        return;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!(missed, "Cycle stream client lagged");
                }
                Err(RecvError::Closed) => return,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => {
                    debug!("Cycle stream client disconnected");
                    return;
                }
                _ => {}
            },
        }
    }
}
