//! Shared type definitions for the live radar.
//!
//! This crate is the single source of truth for the data that flows
//! through the ingestion pipeline. Interchange types served over HTTP
//! flow downstream to `TypeScript` via `ts-rs` for the radar page.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed player identifier
//! - [`enums`] -- Team affiliation
//! - [`game_state`] -- Decoded per-frame game state (decoder output)
//! - [`structs`] -- Snapshot, markers, and highlight state (builder output)

pub mod enums;
pub mod game_state;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Team;
pub use game_state::{Bomb, GameState, Participant};
pub use ids::PlayerId;
pub use structs::{BombMarker, Highlight, MapPoint, PlayerMarker, Snapshot};
