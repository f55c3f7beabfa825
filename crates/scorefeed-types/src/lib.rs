//! Shared type definitions for the Scorefeed event mirror.
//!
//! This crate is the single source of truth for the semantic records that
//! flow from the decode pipeline to the observer API. Types flow downstream
//! to `TypeScript` via `ts-rs` for dashboard consumers.
//!
//! # Modules
//!
//! - [`enums`] -- Event lifecycle status
//! - [`mapping`] -- The upstream code dictionary
//! - [`structs`] -- Events, competitors, and scores

pub mod enums;
pub mod mapping;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::EventStatus;
pub use mapping::Mapping;
pub use structs::{Competitors, Event, Score, Scores};
