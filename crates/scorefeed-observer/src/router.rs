//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- plain-text status line
/// - `GET /state` -- full readable state
/// - `GET /ws/cycles` -- `WebSocket` cycle summary stream
/// - `GET /api/events` -- live events
/// - `GET /api/events/{id}` -- single live event
/// - `GET /api/archive` -- archived events
/// - `GET /api/mappings` -- installed mapping
/// - `GET /api/operator/status`, `POST /api/operator/interval`,
///   `POST /api/operator/stop` -- poll control
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status
        .route("/", get(handlers::index))
        .route("/state", get(handlers::get_state))
        // WebSocket
        .route("/ws/cycles", get(ws::ws_cycles))
        // REST API
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/{id}", get(handlers::get_event))
        .route("/api/archive", get(handlers::list_archive))
        .route("/api/mappings", get(handlers::get_mappings))
        // Operator
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/interval", post(operator::set_interval))
        .route("/api/operator/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
