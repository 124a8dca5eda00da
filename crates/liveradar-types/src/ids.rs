//! Type-safe player identifier.
//!
//! The decoder assigns every connected player a per-match integer user
//! id. It is stable for the lifetime of one ingestion run and is used as
//! the secondary sort key of a snapshot. It is not stable across restarts.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Per-match identifier of a player, as reported by the decoder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PlayerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<PlayerId> for i32 {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}
