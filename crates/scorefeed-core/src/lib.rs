//! Decode-and-reconcile pipeline for the Scorefeed event mirror.
//!
//! This crate turns the upstream's compact encoded feed into semantic event
//! records and keeps a live view plus an archive of events superseded by a
//! dictionary rollover.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `scorefeed-config.yaml`.
//! - [`mapping`] -- Dictionary loader and the installed-mapping store.
//! - [`line`] -- Positional field parser for one snapshot line.
//! - [`decoder`] -- Line and snapshot decoding with per-line diagnostics.
//! - [`cycle`] -- Rollover detection before decoding.
//! - [`refresh`] -- Archive-on-rollover and the refresh-pending gate.
//! - [`store`] -- Live and archived events keyed by id.
//! - [`feed`] -- [`FeedSource`] trait and the scripted [`StaticFeed`].
//! - [`pipeline`] -- One fetch, guard, decode, upsert cycle.
//! - [`control`] -- Shared scheduler controls for the operator API.
//! - [`runner`] -- The cancellable poll loop.
//!
//! [`FeedSource`]: feed::FeedSource
//! [`StaticFeed`]: feed::StaticFeed

pub mod config;
pub mod control;
pub mod cycle;
pub mod decoder;
pub mod feed;
pub mod line;
pub mod mapping;
pub mod pipeline;
pub mod refresh;
pub mod runner;
pub mod store;
