//! Polling HTTP surface for the live radar.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Radar page** (`GET /`) -- a static HTML shell that polls the data
//!   endpoint and draws the players over the background
//! - **Background** (`GET /map`) -- the radar image captured at startup
//! - **Snapshot endpoints** (`GET /data`, `GET /players`, `GET /status`)
//! - **Highlight endpoints** (`GET|POST /select`, `GET /highlight`)
//!
//! # Architecture
//!
//! Every snapshot request performs exactly one
//! [`SnapshotPublisher::read`] and serializes the `Arc` it gets back, so
//! handlers never coordinate with the ingestion thread and never observe
//! a half-published frame.
//!
//! [`SnapshotPublisher::read`]: liveradar_core::publisher::SnapshotPublisher::read

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::AppState;
