//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read from the [`FeedView`] copy in the shared [`AppState`]
//! and return owned JSON. Nothing here can reach the pipeline's own state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Plain-text status line |
//! | `GET` | `/state` | Mapping, live events, archive, refresh flag |
//! | `GET` | `/api/events` | Live events (404 when none) |
//! | `GET` | `/api/events/{id}` | One live event |
//! | `GET` | `/api/archive` | Archived events |
//! | `GET` | `/api/mappings` | The installed mapping |
//!
//! [`FeedView`]: crate::state::FeedView

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- status line
// ---------------------------------------------------------------------------

/// Serve a one-line plain-text status.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = state.snapshot.read().await;
    let gate = if view.refresh_pending {
        "refresh pending"
    } else {
        "decoding"
    };
    format!(
        "Scorefeed observer: cycle {}, {} live, {} archived, {} codes, {gate}\n",
        view.cycle,
        view.live.len(),
        view.archive.len(),
        view.mappings.len(),
    )
}

// ---------------------------------------------------------------------------
// GET /state -- full state copy
// ---------------------------------------------------------------------------

/// Return the full readable state: mapping, live events, archive, the
/// refresh flag, and the cycle counter.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.snapshot.read().await;
    Ok(Json(serde_json::to_value(&*view)?))
}

// ---------------------------------------------------------------------------
// GET /api/events -- live events
// ---------------------------------------------------------------------------

/// List live events in id order.
///
/// Responds 404 when the live store is empty, which is the normal state
/// before the first decode and right after a rollover.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.snapshot.read().await;

    if view.live.is_empty() {
        return Err(ObserverError::NotFound("no live events".to_owned()));
    }

    let events: Vec<_> = view.live.values().collect();
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/events/{id} -- single live event
// ---------------------------------------------------------------------------

/// Return one live event by id.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.snapshot.read().await;

    let event = view
        .live
        .get(&id)
        .ok_or_else(|| ObserverError::NotFound(format!("event {id}")))?;

    Ok(Json(serde_json::to_value(event)?))
}

// ---------------------------------------------------------------------------
// GET /api/archive -- archived events
// ---------------------------------------------------------------------------

/// List archived events in id order. An empty archive is not an error.
pub async fn list_archive(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.snapshot.read().await;

    let events: Vec<_> = view.archive.values().collect();
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/mappings -- installed mapping
// ---------------------------------------------------------------------------

/// Return the installed mapping.
pub async fn get_mappings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let view = state.snapshot.read().await;

    Ok(Json(serde_json::json!({
        "size": view.mappings.len(),
        "mappings": view.mappings,
    })))
}
