use roundwatch_core_types::GameMode;
use serde::{Deserialize, Serialize};

/// Everything the engine needs from the page for one reconciliation pass.
///
/// The defaults are the "could not read" values: unknown mode, empty id, round 0 and
/// no layout showing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFacts {
    pub mode: GameMode,
    pub game_id: String,
    /// 1-based round shown in the round counter; 0 when unreadable.
    pub round: u32,
    pub game_layout: bool,
    pub result_layout: bool,
    pub final_score_layout: bool,
}

impl PageFacts {
    /// A round in progress on a game page.
    pub fn in_round(mode: GameMode, game_id: impl Into<String>, round: u32) -> Self {
        Self {
            mode,
            game_id: game_id.into(),
            round,
            game_layout: true,
            ..Self::default()
        }
    }

    pub fn with_result(mut self) -> Self {
        self.result_layout = true;
        self
    }

    pub fn with_final_score(mut self) -> Self {
        self.final_score_layout = true;
        self
    }
}
