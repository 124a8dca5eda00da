//! Enumeration types for the live radar.

use serde::{Deserialize, Serialize};

/// Team affiliation as reported by the decoder.
///
/// Serialized as its small integer code so the wire format matches the
/// decoder's own numbering: `0` unassigned, `1` spectators, `2`
/// terrorists, `3` counter-terrorists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Team {
    /// Connected but not yet on a side.
    #[default]
    Unassigned,
    /// Watching the match.
    Spectators,
    /// The attacking side (carries the bomb).
    Terrorists,
    /// The defending side.
    CounterTerrorists,
}

impl Team {
    /// Integer code used on the wire.
    pub const fn code(self) -> u8 {
        match self {
            Self::Unassigned => 0,
            Self::Spectators => 1,
            Self::Terrorists => 2,
            Self::CounterTerrorists => 3,
        }
    }

    /// Whether players on this team take part in rounds.
    ///
    /// Only the two sides are playing; spectators and unassigned
    /// connections are never rendered.
    pub const fn is_playing_side(self) -> bool {
        matches!(self, Self::Terrorists | Self::CounterTerrorists)
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.code()
    }
}

/// Error returned for a team code outside `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTeam(pub u8);

impl core::fmt::Display for UnknownTeam {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown team code {}", self.0)
    }
}

impl std::error::Error for UnknownTeam {}

impl TryFrom<u8> for Team {
    type Error = UnknownTeam;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unassigned),
            1 => Ok(Self::Spectators),
            2 => Ok(Self::Terrorists),
            3 => Ok(Self::CounterTerrorists),
            other => Err(UnknownTeam(other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn team_order_follows_wire_code() {
        assert!(Team::Terrorists < Team::CounterTerrorists);
        assert!(Team::Unassigned < Team::Spectators);
    }

    #[test]
    fn team_serde_uses_integer_code() {
        assert_eq!(serde_json::to_string(&Team::CounterTerrorists).unwrap(), "3");
        let team: Team = serde_json::from_str("2").unwrap();
        assert_eq!(team, Team::Terrorists);
        assert!(serde_json::from_str::<Team>("9").is_err());
    }

    #[test]
    fn only_sides_are_playing() {
        assert!(Team::Terrorists.is_playing_side());
        assert!(Team::CounterTerrorists.is_playing_side());
        assert!(!Team::Spectators.is_playing_side());
        assert!(!Team::Unassigned.is_playing_side());
    }
}
