//! Live ingestion and snapshot publication for the radar.
//!
//! This crate turns a replay recording that another process is still
//! writing into a stream of immutable [`Snapshot`]s:
//!
//! ```text
//! file bytes -> tail -> decoder -> snapshot (projection) -> publisher
//! ```
//!
//! # Modules
//!
//! - [`tail`] -- Growing-file reader that never reports end-of-file, plus
//!   the wait for the recording to appear.
//! - [`decoder`] -- [`FrameDecoder`] trait, the newline-delimited JSON
//!   decoder, and a scripted decoder for tests.
//! - [`maps`] -- Map transforms, the map catalog, and radar backgrounds.
//! - [`projection`] -- World-to-percentage coordinate projection.
//! - [`snapshot`] -- Builds one [`Snapshot`] from one decoded frame.
//! - [`publisher`] -- Single-writer, many-reader slot for the current
//!   snapshot and the highlighted player.
//! - [`ingest`] -- The ingestion loop and its error taxonomy.
//! - [`config`] -- Configuration loading from `liveradar-config.yaml`.
//!
//! [`Snapshot`]: liveradar_types::Snapshot
//! [`FrameDecoder`]: decoder::FrameDecoder

pub mod config;
pub mod decoder;
pub mod ingest;
pub mod maps;
pub mod projection;
pub mod publisher;
pub mod snapshot;
pub mod tail;
