//! Rendering-ready structures served to radar clients.
//!
//! A [`Snapshot`] is built from exactly one decoded frame and never
//! mutated afterwards; a new frame produces a new snapshot that replaces
//! the old one wholesale. Coordinates are normalized percentages of the
//! background image, so `x = 50.0` is the horizontal centre of the radar
//! whatever its pixel resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Team;
use crate::ids::PlayerId;

/// A position expressed as a percentage of the background's width and
/// height.
///
/// Not clamped: positions outside the radar image produce values below
/// 0 or above 100, and consumers must tolerate that.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MapPoint {
    /// Horizontal percentage (0 = left edge, 100 = right edge).
    pub x: f64,
    /// Vertical percentage (0 = top edge, 100 = bottom edge).
    pub y: f64,
}

/// A living player as drawn on the radar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlayerMarker {
    /// Display name.
    pub name: String,
    /// Health points.
    pub health: i32,
    /// Team code (2 = terrorists, 3 = counter-terrorists).
    #[ts(type = "number")]
    pub team: Team,
    /// Always `true`: dead players are left out of snapshots entirely.
    pub is_alive: bool,
    /// Per-match user id.
    pub user_id: PlayerId,
    /// Normalized horizontal position.
    pub x: f64,
    /// Normalized vertical position.
    pub y: f64,
}

impl PlayerMarker {
    /// Sort key of the snapshot ordering: team first, then user id.
    pub const fn ordering_key(&self) -> (Team, PlayerId) {
        (self.team, self.user_id)
    }
}

/// The bomb when it lies on the ground (or is planted).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BombMarker {
    /// Normalized horizontal position.
    pub x: f64,
    /// Normalized vertical position.
    pub y: f64,
}

impl From<MapPoint> for BombMarker {
    fn from(p: MapPoint) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// The complete radar state derived from one decoded frame.
///
/// Serializes to `{"players": [...], "bomb": {...} | null}`. The
/// bookkeeping fields are kept out of the wire format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Living players ordered by `(team, user_id)` ascending.
    pub players: Vec<PlayerMarker>,
    /// The bomb, present only when nobody is carrying it.
    pub bomb: Option<BombMarker>,
    /// Position of this snapshot in the ingestion order (0 = initial).
    #[serde(skip)]
    pub sequence: u64,
    /// Server tick of the frame this snapshot was built from.
    #[serde(skip)]
    pub tick: u64,
    /// When the snapshot replaced its predecessor.
    #[serde(skip)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The initial snapshot served before any frame is decoded.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether players are strictly ordered by `(team, user_id)`.
    ///
    /// Strictness also rules out duplicate ids within a team.
    pub fn is_canonically_ordered(&self) -> bool {
        self.players
            .windows(2)
            .all(|w| matches!(w, [a, b] if a.ordering_key() < b.ordering_key()))
    }
}

/// The player singled out on the radar page.
///
/// Every change bumps `version`, so a client can tell a re-selection of
/// the same player from no change at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Highlight {
    /// The highlighted player, if any.
    pub user_id: Option<PlayerId>,
    /// Number of changes applied so far.
    #[ts(type = "number")]
    pub version: u64,
}
