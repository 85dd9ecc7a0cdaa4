//! Typed view over a game/challenge data payload.
//!
//! Only the fields the observer consumes are modelled; everything else in the body is
//! ignored. Numeric amounts arrive as numbers or as strings depending on the endpoint,
//! and may be `null`; a missing or null amount reads as zero.

use roundwatch_core_types::{
    Coordinate, Distance, DistanceMeasurement, MapInfo, Round, ScoreMeasurement,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GamePayload {
    /// Game or challenge id the payload belongs to.
    pub token: String,
    /// Round the payload was produced for (1-based).
    pub round: u32,
    pub map: Option<String>,
    pub map_name: Option<String>,
    pub rounds: Vec<PayloadRound>,
    pub player: Option<PayloadPlayer>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadRound {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayloadPlayer {
    pub guesses: Vec<PayloadGuess>,
    pub total_score: Option<PayloadScore>,
    pub total_distance: Option<PayloadDistance>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayloadGuess {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub round_score: Option<PayloadScore>,
    pub distance: Option<PayloadDistance>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadScore {
    pub amount: Option<Amount>,
    pub unit: Option<String>,
    pub percentage: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadDistance {
    pub meters: PayloadAmount,
    pub miles: PayloadAmount,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadAmount {
    pub amount: Option<Amount>,
    pub unit: Option<String>,
}

/// A number the host sends either as a JSON number or as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn value(&self) -> f64 {
        match self {
            Amount::Number(value) => *value,
            Amount::Text(text) => parse_leading_float(text).unwrap_or(0.0),
        }
    }
}

fn amount_value(amount: Option<&Amount>) -> f64 {
    amount.map_or(0.0, Amount::value)
}

/// Running totals reported alongside the guesses.
#[derive(Clone, Debug, PartialEq)]
pub struct Totals {
    pub score: ScoreMeasurement,
    pub distance: Distance,
}

impl GamePayload {
    /// Exact id/round equality. A payload without a token never matches.
    pub fn matches(&self, game_id: &str, round: u32) -> bool {
        !self.token.is_empty() && self.token == game_id && self.round == round
    }

    /// Builds round `number` (1-based) from `rounds[number-1]` and the player's guess
    /// for that round. `None` unless every part is present.
    pub fn round_record(&self, number: u32) -> Option<Round> {
        let index = (number as usize).checked_sub(1)?;
        let location = self.rounds.get(index)?;
        let guess = self.player.as_ref()?.guesses.get(index)?;
        let score = guess.round_score.as_ref()?;
        let distance = guess.distance.as_ref()?;
        Some(Round {
            location: Coordinate::new(location.lat, location.lng),
            player_guess: Coordinate::new(guess.lat, guess.lng),
            distance: distance.to_distance(),
            score: score.to_measurement(),
        })
    }

    pub fn totals(&self) -> Option<Totals> {
        let player = self.player.as_ref()?;
        Some(Totals {
            score: player.total_score.as_ref()?.to_measurement(),
            distance: player.total_distance.as_ref()?.to_distance(),
        })
    }

    pub fn map_info(&self) -> Option<MapInfo> {
        let id = self.map.clone()?;
        Some(MapInfo {
            id,
            name: self.map_name.clone().unwrap_or_default(),
        })
    }
}

impl PayloadScore {
    pub fn to_measurement(&self) -> ScoreMeasurement {
        ScoreMeasurement {
            amount: amount_value(self.amount.as_ref()),
            unit: self.unit.clone().unwrap_or_default(),
            percentage: self.percentage.unwrap_or(0.0),
        }
    }
}

impl PayloadDistance {
    pub fn to_distance(&self) -> Distance {
        Distance {
            meters: self.meters.to_measurement(),
            miles: self.miles.to_measurement(),
        }
    }
}

impl PayloadAmount {
    fn to_measurement(&self) -> DistanceMeasurement {
        DistanceMeasurement::new(
            amount_value(self.amount.as_ref()),
            self.unit.as_deref().unwrap_or_default(),
        )
    }
}

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace, so that
/// `"12.5 km"` yields `12.5`.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let candidate_len = trimmed
        .char_indices()
        .find(|(_, ch)| !matches!(ch, '0'..='9' | '.' | '+' | '-' | 'e' | 'E'))
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    let candidate = &trimmed[..candidate_len];
    (1..=candidate.len())
        .rev()
        .filter(|end| candidate.is_char_boundary(*end))
        .find_map(|end| candidate[..end].parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundwatch_core_types::DistanceUnit;
    use serde_json::json;

    fn sample() -> GamePayload {
        serde_json::from_value(json!({
            "token": "abc",
            "round": 1,
            "map": "world",
            "mapName": "A Diverse World",
            "rounds": [{"lat": 48.85, "lng": 2.35}],
            "player": {
                "guesses": [{
                    "lat": 48.0,
                    "lng": 2.0,
                    "roundScore": {"amount": "4321", "unit": "points", "percentage": 86.4},
                    "distance": {
                        "meters": {"amount": "104.2", "unit": "km"},
                        "miles": {"amount": 64.7, "unit": "miles"}
                    }
                }],
                "totalScore": {"amount": "4321", "unit": "points", "percentage": 17.3},
                "totalDistance": {
                    "meters": {"amount": "104.2", "unit": "km"},
                    "miles": {"amount": "64.7", "unit": "miles"}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn leading_float_matches_prefix_semantics() {
        assert_eq!(parse_leading_float("12.5 km"), Some(12.5));
        assert_eq!(parse_leading_float("  7"), Some(7.0));
        assert_eq!(parse_leading_float("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_float("1,234"), Some(1.0));
        assert_eq!(parse_leading_float("km"), None);
        assert_eq!(parse_leading_float(""), None);
    }

    #[test]
    fn round_record_reads_location_and_guess() {
        let round = sample().round_record(1).expect("round 1");
        assert_eq!(round.location, Coordinate::new(Some(48.85), Some(2.35)));
        assert_eq!(round.player_guess, Coordinate::new(Some(48.0), Some(2.0)));
        assert_eq!(round.score.amount, 4321.0);
        assert_eq!(round.score.percentage, 86.4);
        assert_eq!(round.distance.meters.amount, 104.2);
        assert_eq!(round.distance.meters.unit, DistanceUnit::Kilometers);
        assert_eq!(round.distance.miles.amount, 64.7);
    }

    #[test]
    fn round_record_requires_every_part() {
        let payload = sample();
        assert!(payload.round_record(0).is_none());
        assert!(payload.round_record(2).is_none());

        let mut no_score = payload.clone();
        no_score.player.as_mut().unwrap().guesses[0].round_score = None;
        assert!(no_score.round_record(1).is_none());
    }

    #[test]
    fn null_amounts_read_as_zero() {
        let payload: GamePayload = serde_json::from_value(json!({
            "token": "abc",
            "round": 1,
            "rounds": [{"lat": 1.0, "lng": 2.0}],
            "player": {
                "guesses": [{
                    "lat": null,
                    "lng": null,
                    "roundScore": {"amount": null, "unit": "points", "percentage": null},
                    "distance": {
                        "meters": {"amount": null, "unit": "km"},
                        "miles": {"amount": "0", "unit": null}
                    }
                }],
                "totalScore": {"amount": null, "unit": "points", "percentage": 0},
                "totalDistance": {"meters": {"amount": null, "unit": "km"}}
            }
        }))
        .expect("null amounts are accepted");

        let round = payload.round_record(1).expect("round still recorded");
        assert_eq!(round.score.amount, 0.0);
        assert_eq!(round.score.percentage, 0.0);
        assert_eq!(round.score.unit, "points");
        assert_eq!(round.distance.meters.amount, 0.0);
        assert_eq!(round.distance.meters.unit, DistanceUnit::Kilometers);
        assert_eq!(round.player_guess, Coordinate::new(None, None));
        assert_eq!(payload.totals().expect("totals").score.amount, 0.0);
    }

    #[test]
    fn totals_and_map_are_extracted() {
        let payload = sample();
        let totals = payload.totals().expect("totals");
        assert_eq!(totals.score.amount, 4321.0);
        assert_eq!(totals.distance.miles.amount, 64.7);
        let map = payload.map_info().expect("map");
        assert_eq!(map.id, "world");
        assert_eq!(map.name, "A Diverse World");
    }

    #[test]
    fn matches_requires_exact_token_and_round() {
        let payload = sample();
        assert!(payload.matches("abc", 1));
        assert!(!payload.matches("abc", 2));
        assert!(!payload.matches("abd", 1));
        assert!(!GamePayload::default().matches("", 0));
    }
}
