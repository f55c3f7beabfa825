//! Observer API server for the Scorefeed event mirror.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for reading the decoded state: the full state,
//!   live events, the archive, and the installed mapping
//! - **`WebSocket` endpoint** (`/ws/cycles`) streaming one summary per
//!   poll cycle via [`tokio::sync::broadcast`]
//! - **Operator endpoints** for poller status, interval changes, and stop
//!
//! # Architecture
//!
//! The pipeline owns its state exclusively. After each cycle the engine
//! publishes a [`FeedView`] copy into [`AppState`]; handlers only ever read
//! that copy, so a request never observes a cycle half-applied.
//!
//! [`FeedView`]: state::FeedView
//! [`AppState`]: state::AppState

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::{AppState, CycleBroadcast, FeedView};
