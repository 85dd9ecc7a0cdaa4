pub mod state;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use state::{
    Coordinate, Distance, DistanceMeasurement, GameState, MapInfo, Round, ScoreMeasurement,
};

/// Which kind of session the page URL points at.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Game,
    Challenge,
    /// Neither a game nor a challenge page; the engine ignores the page entirely.
    #[default]
    Unrecognized,
}

impl GameMode {
    pub fn is_recognized(self) -> bool {
        !matches!(self, GameMode::Unrecognized)
    }

    pub fn is_challenge(self) -> bool {
        matches!(self, GameMode::Challenge)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameMode::Game => "game",
            GameMode::Challenge => "challenge",
            GameMode::Unrecognized => "none",
        };
        f.write_str(label)
    }
}

/// Unit attached to a distance amount. Serialized as the bare unit string the host
/// application reports (`"km"`, `"miles"`, ...).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Feet,
    Yards,
    Miles,
    Other(String),
}

impl DistanceUnit {
    pub fn as_str(&self) -> &str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Yards => "yd",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for DistanceUnit {
    /// Only the exact strings [`DistanceUnit::as_str`] produces map to a known unit;
    /// anything else is kept verbatim so it serializes back unchanged.
    fn from(value: String) -> Self {
        match value.as_str() {
            "m" => DistanceUnit::Meters,
            "km" => DistanceUnit::Kilometers,
            "ft" => DistanceUnit::Feet,
            "yd" => DistanceUnit::Yards,
            "miles" => DistanceUnit::Miles,
            _ => DistanceUnit::Other(value),
        }
    }
}

impl From<&str> for DistanceUnit {
    fn from(value: &str) -> Self {
        DistanceUnit::from(value.to_string())
    }
}

impl From<DistanceUnit> for String {
    fn from(value: DistanceUnit) -> Self {
        match value {
            DistanceUnit::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four lifecycle notifications published to listeners.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    GameStart,
    RoundStart,
    RoundEnd,
    GameEnd,
}

impl LifecycleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleKind::GameStart => "game_start",
            LifecycleKind::RoundStart => "round_start",
            LifecycleKind::RoundEnd => "round_end",
            LifecycleKind::GameEnd => "game_end",
        }
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle notification together with the full game state at the moment it fired.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: LifecycleKind,
    pub state: GameState,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleKind, state: &GameState) -> Self {
        Self {
            kind,
            state: state.clone(),
        }
    }
}
