//! The reconstructed game-progress model.
//!
//! Every struct defaults missing fields on deserialize so that state persisted by an
//! older build still loads.

use serde::{Deserialize, Serialize};

use crate::DistanceUnit;

/// Latitude/longitude pair. Either half may be unknown for some map types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinate {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Coordinate {
    pub fn new(lat: Option<f64>, lng: Option<f64>) -> Self {
        Self { lat, lng }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMeasurement {
    pub amount: f64,
    pub unit: DistanceUnit,
}

impl DistanceMeasurement {
    pub fn new(amount: f64, unit: impl Into<DistanceUnit>) -> Self {
        Self {
            amount,
            unit: unit.into(),
        }
    }
}

impl Default for DistanceMeasurement {
    fn default() -> Self {
        Self::new(0.0, DistanceUnit::Kilometers)
    }
}

/// The same distance reported in both unit systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distance {
    pub meters: DistanceMeasurement,
    pub miles: DistanceMeasurement,
}

impl Default for Distance {
    fn default() -> Self {
        Self {
            meters: DistanceMeasurement::new(0.0, DistanceUnit::Kilometers),
            miles: DistanceMeasurement::new(0.0, DistanceUnit::Miles),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreMeasurement {
    pub amount: f64,
    pub unit: String,
    /// Share of the maximum score, 0..=100.
    pub percentage: f64,
}

impl Default for ScoreMeasurement {
    fn default() -> Self {
        Self {
            amount: 0.0,
            unit: "points".to_string(),
            percentage: 0.0,
        }
    }
}

/// One completed round. Written once, from a matching network payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Round {
    pub location: Coordinate,
    pub player_guess: Coordinate,
    pub distance: Distance,
    pub score: ScoreMeasurement,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapInfo {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub current_game_id: String,
    pub is_challenge_link: bool,
    pub current_round: u32,
    pub round_in_progress: bool,
    pub game_in_progress: bool,
    pub total_distance: Distance,
    pub total_score: ScoreMeasurement,
    /// Indexed by round number minus one. A `None` hole marks a round that ended
    /// without a matching payload.
    pub rounds: Vec<Option<Round>>,
    pub map: MapInfo,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            current_game_id: String::new(),
            is_challenge_link: false,
            current_round: 0,
            round_in_progress: false,
            game_in_progress: true,
            total_distance: Distance::default(),
            total_score: ScoreMeasurement::default(),
            rounds: Vec::new(),
            map: MapInfo::default(),
        }
    }
}

impl GameState {
    /// Clears the fields that only live signals can establish. Applied to every state
    /// restored from persistence so a reload never resumes mid-round.
    pub fn reset_transient(&mut self) {
        let defaults = GameState::default();
        self.current_round = defaults.current_round;
        self.round_in_progress = defaults.round_in_progress;
        self.game_in_progress = defaults.game_in_progress;
    }

    /// The recorded round with 1-based number `number`, if any.
    pub fn round(&self, number: u32) -> Option<&Round> {
        let index = (number as usize).checked_sub(1)?;
        self.rounds.get(index)?.as_ref()
    }

    /// Writes round `number` (1-based), padding skipped rounds with holes.
    pub fn set_round(&mut self, number: u32, round: Round) {
        let Some(index) = (number as usize).checked_sub(1) else {
            return;
        };
        if self.rounds.len() <= index {
            self.rounds.resize(index + 1, None);
        }
        self.rounds[index] = Some(round);
    }

    pub fn recorded_rounds(&self) -> usize {
        self.rounds.iter().filter(|round| round.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fresh_session() {
        let state = GameState::default();
        assert_eq!(state.current_round, 0);
        assert!(!state.round_in_progress);
        assert!(state.game_in_progress);
        assert_eq!(state.total_score.unit, "points");
        assert_eq!(state.total_distance.meters.unit, DistanceUnit::Kilometers);
        assert_eq!(state.total_distance.miles.unit, DistanceUnit::Miles);
    }

    #[test]
    fn set_round_pads_missing_rounds_with_holes() {
        let mut state = GameState::default();
        state.set_round(3, Round::default());
        assert_eq!(state.rounds.len(), 3);
        assert!(state.round(1).is_none());
        assert!(state.round(3).is_some());
        assert_eq!(state.recorded_rounds(), 1);

        state.set_round(0, Round::default());
        assert_eq!(state.rounds.len(), 3);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: GameState =
            serde_json::from_str(r#"{"current_game_id":"abc","rounds":[null]}"#).unwrap();
        assert_eq!(state.current_game_id, "abc");
        assert!(state.game_in_progress);
        assert_eq!(state.rounds, vec![None]);
        assert_eq!(state.total_score, ScoreMeasurement::default());
    }

    #[test]
    fn serialized_shape_uses_plain_unit_strings() {
        let json = serde_json::to_value(GameState::default()).unwrap();
        assert_eq!(json["total_distance"]["meters"]["unit"], "km");
        assert_eq!(json["total_distance"]["miles"]["unit"], "miles");
        assert_eq!(json["map"]["id"], "");
    }
}
