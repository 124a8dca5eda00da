//! Decoded per-frame game state.
//!
//! These are the records a frame decoder hands to the snapshot builder:
//! the participant roster with raw world positions, and the bomb. They
//! carry world-space coordinates and are never served directly.
//!
//! The serde layout doubles as the newline-delimited JSON recording
//! format read by the bundled decoder:
//!
//! ```json
//! {"tick":812,"participants":[{"userId":3,"name":"alice","health":100,
//!   "team":2,"connected":true,"alive":true,"position":[-1200.5,300.0,64.0]}],
//!  "bomb":{"position":[-950.0,420.0,0.0],"carrier":null}}
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::Team;
use crate::ids::PlayerId;

/// One fully decoded game-state frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Server tick the frame was recorded at.
    #[serde(default)]
    pub tick: u64,
    /// Every connection known to the decoder, playing or not.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// The bomb, if it exists in this round.
    #[serde(default)]
    pub bomb: Option<Bomb>,
}

impl GameState {
    /// Participants that are connected and on one of the two sides.
    pub fn playing(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_playing())
    }
}

/// A single connection on the decoder's roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Per-match user id.
    pub user_id: PlayerId,
    /// Display name (may be empty or duplicated).
    #[serde(default)]
    pub name: String,
    /// Health points, 0-100 by convention. Not validated.
    #[serde(default)]
    pub health: i32,
    /// Team affiliation.
    #[serde(default)]
    pub team: Team,
    /// Whether the connection is currently live.
    #[serde(default)]
    pub connected: bool,
    /// Whether the player is alive this frame.
    #[serde(default)]
    pub alive: bool,
    /// World-space position `[x, y, z]`.
    #[serde(default)]
    pub position: DVec3,
}

impl Participant {
    /// Connected and part of the match roster on a playing side.
    pub const fn is_playing(&self) -> bool {
        self.connected && self.team.is_playing_side()
    }
}

/// The objective device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bomb {
    /// World-space position `[x, y, z]`.
    #[serde(default)]
    pub position: DVec3,
    /// The player currently carrying it, if any.
    #[serde(default)]
    pub carrier: Option<PlayerId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_recording_line() {
        let line = r#"{"tick":812,"participants":[{"userId":3,"name":"alice","health":100,"team":2,"connected":true,"alive":true,"position":[-1200.5,300.0,64.0]}],"bomb":{"position":[-950.0,420.0,0.0],"carrier":null}}"#;
        let state: GameState = serde_json::from_str(line).unwrap();
        assert_eq!(state.tick, 812);
        assert_eq!(state.participants.len(), 1);
        let alice = &state.participants[0];
        assert_eq!(alice.user_id, PlayerId(3));
        assert_eq!(alice.team, Team::Terrorists);
        assert!((alice.position.x - -1200.5).abs() < f64::EPSILON);
        assert!(state.bomb.unwrap().carrier.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let state: GameState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, GameState::default());
    }

    #[test]
    fn playing_excludes_spectators_and_disconnected() {
        let mk = |id, team, connected| Participant {
            user_id: PlayerId(id),
            team,
            connected,
            alive: true,
            ..Participant::default()
        };
        let state = GameState {
            participants: vec![
                mk(1, Team::Terrorists, true),
                mk(2, Team::Spectators, true),
                mk(3, Team::CounterTerrorists, false),
                mk(4, Team::Unassigned, true),
            ],
            ..GameState::default()
        };
        let ids: Vec<_> = state.playing().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![PlayerId(1)]);
    }
}
