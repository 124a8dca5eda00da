//! Building a [`Snapshot`] from one decoded frame.
//!
//! The builder is a pure function of the frame and the projection: it
//! reads both and returns a self-contained value. Policy:
//!
//! - only participants that are playing (connected, on a side) *and*
//!   alive are included. Dead players are left out, not flagged;
//! - players are ordered by `(team, user_id)` ascending whatever order
//!   the decoder listed them in. A user id reported twice keeps its first
//!   entry;
//! - the bomb is included only when the frame has one and nobody carries
//!   it.

use std::collections::BTreeSet;

use liveradar_types::{BombMarker, GameState, Participant, PlayerMarker, Snapshot};

use crate::projection::MapProjection;

/// Build the snapshot for `state`.
///
/// `sequence` tags the snapshot with its position in the ingestion
/// order; it is not part of the wire format.
pub fn build_snapshot(state: &GameState, projection: &MapProjection, sequence: u64) -> Snapshot {
    let mut seen = BTreeSet::new();
    let mut players: Vec<PlayerMarker> = state
        .playing()
        .filter(|p| p.alive && seen.insert(p.user_id))
        .map(|p| player_marker(p, projection))
        .collect();
    players.sort_by_key(PlayerMarker::ordering_key);

    Snapshot {
        players,
        bomb: bomb_marker(state, projection),
        sequence,
        tick: state.tick,
        published_at: None,
    }
}

fn player_marker(participant: &Participant, projection: &MapProjection) -> PlayerMarker {
    let point = projection.project(participant.position);
    PlayerMarker {
        name: participant.name.clone(),
        health: participant.health,
        team: participant.team,
        is_alive: true,
        user_id: participant.user_id,
        x: point.x,
        y: point.y,
    }
}

/// The bomb marker, if the bomb exists and has no carrier.
fn bomb_marker(state: &GameState, projection: &MapProjection) -> Option<BombMarker> {
    state
        .bomb
        .as_ref()
        .filter(|bomb| bomb.carrier.is_none())
        .map(|bomb| projection.project(bomb.position).into())
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use liveradar_types::{Bomb, PlayerId, Team};

    use super::*;
    use crate::projection::{MapTransform, Resolution};

    fn projection() -> MapProjection {
        MapProjection::new(
            "de_test",
            MapTransform::new(-1000.0, 1000.0, 2.0),
            Resolution::new(1000, 500),
        )
    }

    fn player(id: i32, team: Team, alive: bool, x: f64, y: f64) -> Participant {
        Participant {
            user_id: PlayerId(id),
            name: format!("player{id}"),
            health: if alive { 100 } else { 0 },
            team,
            connected: true,
            alive,
            position: DVec3::new(x, y, 0.0),
        }
    }

    fn ids(snapshot: &Snapshot) -> Vec<(u8, i32)> {
        snapshot
            .players
            .iter()
            .map(|p| (p.team.code(), p.user_id.into_inner()))
            .collect()
    }

    #[test]
    fn orders_by_team_then_id() {
        let state = GameState {
            tick: 10,
            participants: vec![
                player(7, Team::Terrorists, true, 0.0, 0.0),
                player(1, Team::CounterTerrorists, true, 0.0, 0.0),
                player(3, Team::Terrorists, true, 0.0, 0.0),
            ],
            bomb: None,
        };
        let snapshot = build_snapshot(&state, &projection(), 1);
        assert_eq!(ids(&snapshot), vec![(2, 3), (2, 7), (3, 1)]);
        assert!(snapshot.is_canonically_ordered());
        assert_eq!(snapshot.tick, 10);
        assert_eq!(snapshot.sequence, 1);
    }

    #[test]
    fn ordering_is_independent_of_decode_order() {
        let roster = vec![
            player(5, Team::CounterTerrorists, true, 0.0, 0.0),
            player(2, Team::Terrorists, true, 0.0, 0.0),
            player(9, Team::Terrorists, true, 0.0, 0.0),
            player(4, Team::CounterTerrorists, true, 0.0, 0.0),
        ];
        let mut reversed = roster.clone();
        reversed.reverse();

        let a = build_snapshot(
            &GameState {
                participants: roster,
                ..GameState::default()
            },
            &projection(),
            1,
        );
        let b = build_snapshot(
            &GameState {
                participants: reversed,
                ..GameState::default()
            },
            &projection(),
            1,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn dead_and_non_playing_participants_are_omitted() {
        let mut spectator = player(8, Team::Spectators, true, 0.0, 0.0);
        spectator.name = "caster".to_owned();
        let mut disconnected = player(6, Team::Terrorists, true, 0.0, 0.0);
        disconnected.connected = false;

        let state = GameState {
            participants: vec![
                player(1, Team::Terrorists, false, 0.0, 0.0),
                player(2, Team::CounterTerrorists, true, 0.0, 0.0),
                spectator,
                disconnected,
            ],
            ..GameState::default()
        };
        let snapshot = build_snapshot(&state, &projection(), 1);
        assert_eq!(ids(&snapshot), vec![(3, 2)]);
        assert!(snapshot.players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn empty_roster_and_no_bomb_is_not_an_error() {
        let snapshot = build_snapshot(&GameState::default(), &projection(), 3);
        assert!(snapshot.players.is_empty());
        assert!(snapshot.bomb.is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_entry() {
        let mut twin = player(4, Team::CounterTerrorists, true, 0.0, 0.0);
        twin.name = "twin".to_owned();
        let state = GameState {
            participants: vec![
                player(4, Team::Terrorists, true, 0.0, 0.0),
                twin,
                player(4, Team::Terrorists, true, 10.0, 10.0),
            ],
            ..GameState::default()
        };
        let snapshot = build_snapshot(&state, &projection(), 1);
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.players[0].name, "player4");
        assert_eq!(snapshot.players[0].team, Team::Terrorists);
    }

    #[test]
    fn positions_are_projected_and_normalized() {
        let state = GameState {
            participants: vec![player(1, Team::Terrorists, true, -500.0, 750.0)],
            bomb: Some(Bomb {
                position: DVec3::new(0.0, 500.0, 30.0),
                carrier: None,
            }),
            ..GameState::default()
        };
        let projection = projection();
        let snapshot = build_snapshot(&state, &projection, 1);

        // pixel (250, 125) of a 1000x500 image
        let p = &snapshot.players[0];
        assert!((p.x - 25.0).abs() < 1e-9);
        assert!((p.y - 25.0).abs() < 1e-9);

        // pixel (500, 250)
        let bomb = snapshot.bomb.unwrap_or(BombMarker { x: -1.0, y: -1.0 });
        assert!((bomb.x - 50.0).abs() < 1e-9);
        assert!((bomb.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn carried_bomb_is_hidden() {
        let state = GameState {
            participants: vec![player(3, Team::Terrorists, true, 0.0, 0.0)],
            bomb: Some(Bomb {
                position: DVec3::ZERO,
                carrier: Some(PlayerId(3)),
            }),
            ..GameState::default()
        };
        assert!(build_snapshot(&state, &projection(), 1).bomb.is_none());
    }

    #[test]
    fn dropped_bomb_is_shown() {
        let state = GameState {
            participants: vec![player(3, Team::Terrorists, true, 0.0, 0.0)],
            bomb: Some(Bomb {
                position: DVec3::new(-1000.0, 1000.0, 0.0),
                carrier: None,
            }),
            ..GameState::default()
        };
        let bomb = build_snapshot(&state, &projection(), 1).bomb;
        assert_eq!(bomb, Some(BombMarker { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn any_reported_carrier_hides_the_bomb() {
        // The carrier is not on the playing roster at all.
        let state = GameState {
            participants: vec![player(3, Team::Terrorists, false, 0.0, 0.0)],
            bomb: Some(Bomb {
                position: DVec3::ZERO,
                carrier: Some(PlayerId(9)),
            }),
            ..GameState::default()
        };
        assert!(build_snapshot(&state, &projection(), 1).bomb.is_none());
    }
}
