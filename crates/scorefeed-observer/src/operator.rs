//! Operator REST API handlers for runtime poll control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current poller status |
//! | `POST` | `/api/operator/interval` | Set the poll interval (ms) |
//! | `POST` | `/api/operator/stop` | Stop polling after the current cycle |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use scorefeed_core::control::{MIN_POLL_INTERVAL_MS, PollControl};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/interval`.
#[derive(Debug, serde::Deserialize)]
pub struct SetIntervalRequest {
    /// New poll interval in milliseconds (minimum 100).
    pub poll_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

fn control(state: &AppState) -> Result<&Arc<PollControl>, ObserverError> {
    state
        .control
        .as_ref()
        .ok_or_else(|| ObserverError::Internal("poll control not available".to_owned()))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return the poller status: cycle, interval, bound, refresh flag, uptime.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let control = control(&state)?;
    let view = state.snapshot.read().await;

    Ok(Json(control.status(view.cycle, view.refresh_pending)))
}

// ---------------------------------------------------------------------------
// POST /api/operator/interval
// ---------------------------------------------------------------------------

/// Change the poll interval at runtime.
///
/// Takes effect from the next inter-cycle sleep.
pub async fn set_interval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIntervalRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let control = control(&state)?;

    control.set_poll_interval_ms(body.poll_interval_ms).map_or_else(
        || {
            Err(ObserverError::InvalidRequest(format!(
                "poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
            )))
        },
        |prev| {
            Ok(Json(serde_json::json!({
                "ok": true,
                "message": format!("Poll interval changed from {prev}ms to {}ms", body.poll_interval_ms),
                "previous_interval_ms": prev,
                "new_interval_ms": body.poll_interval_ms,
            })))
        },
    )
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Stop polling.
///
/// A cycle in flight runs to completion; a sleeping poller wakes and exits.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let control = control(&state)?;

    control.request_stop();

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested -- polling will end after the current cycle".to_owned(),
    }))
}
