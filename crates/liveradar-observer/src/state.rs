//! Shared application state for the radar HTTP surface.
//!
//! [`AppState`] holds the [`SnapshotPublisher`] the ingestion thread
//! writes to and the background image resolved at startup. Nothing in it
//! is mutated by handlers except the publisher's highlight.

use std::sync::Arc;

use axum::body::Bytes;
use liveradar_core::maps::Background;
use liveradar_core::publisher::SnapshotPublisher;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The snapshot slot shared with the ingestion thread.
    pub publisher: Arc<SnapshotPublisher>,
    /// PNG bytes served by `GET /map`.
    pub background: Bytes,
    /// Name of the map being shown.
    pub map_name: String,
}

impl AppState {
    /// Create the state for `map_name` with the given background.
    pub fn new(
        publisher: Arc<SnapshotPublisher>,
        background: &Background,
        map_name: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            background: Bytes::copy_from_slice(background.png()),
            map_name: map_name.into(),
        }
    }
}
