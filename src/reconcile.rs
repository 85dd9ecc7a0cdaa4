//! The reconciliation state machine.
//!
//! Page facts decide *when* a round or game boundary was crossed; the latest tapped
//! payload decides *what* happened in that round. [`reconcile`] is pure: it takes the
//! current state and one observation and returns the next state plus the lifecycle
//! events to publish, leaving persistence and delivery to the engine.

use network_tap_light::GamePayload;
use perceiver_structural::PageFacts;
use roundwatch_core_types::{GameState, LifecycleEvent, LifecycleKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rules {
    /// Number of the final round; finalizing it fires `game_end`.
    pub total_rounds: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciled {
    pub state: GameState,
    pub events: Vec<LifecycleEvent>,
    /// False when the pass changed nothing; the caller must then neither persist nor
    /// publish.
    pub mutated: bool,
}

/// Coarse position of a session in the round loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    RoundActive,
    RoundResult,
    GameFinished,
}

pub fn phase(state: &GameState, rules: &Rules) -> Phase {
    if state.current_round == 0 {
        Phase::Idle
    } else if state.round_in_progress {
        Phase::RoundActive
    } else if !state.game_in_progress || state.current_round >= rules.total_rounds {
        Phase::GameFinished
    } else {
        Phase::RoundResult
    }
}

/// Runs one pass over `prior`.
///
/// `payload` is whatever the tap currently holds. It is only used for a round when its
/// embedded token and round equal the round being started or finalized.
pub fn reconcile(
    prior: &GameState,
    facts: &PageFacts,
    payload: Option<&GamePayload>,
    rules: &Rules,
) -> Reconciled {
    let mut pass = Pass {
        state: prior.clone(),
        events: Vec::new(),
        mutated: false,
        payload,
        rules,
    };

    if !facts.mode.is_recognized() || !facts.game_layout {
        return pass.finish();
    }

    // Round 0 or an empty id is a mid-render read, not a boundary.
    let readable = facts.round != 0 && !facts.game_id.is_empty();
    let crossed = readable
        && (facts.round != pass.state.current_round
            || facts.game_id != pass.state.current_game_id);

    if crossed {
        // The page may skip the result screen entirely; close the round we are leaving.
        if pass.state.round_in_progress {
            pass.stop_round();
        }
        pass.start_round(facts);
    } else if facts.result_layout && pass.state.round_in_progress {
        pass.stop_round();
    } else if facts.final_score_layout && pass.state.game_in_progress {
        pass.state.game_in_progress = false;
        pass.mutated = true;
        info!(
            game_id = %pass.state.current_game_id,
            round = pass.state.current_round,
            "final score shown; game no longer in progress"
        );
    }

    pass.finish()
}

struct Pass<'a> {
    state: GameState,
    events: Vec<LifecycleEvent>,
    mutated: bool,
    payload: Option<&'a GamePayload>,
    rules: &'a Rules,
}

impl<'a> Pass<'a> {
    fn lookup(&self) -> Option<&'a GamePayload> {
        let (game_id, round) = (&self.state.current_game_id, self.state.current_round);
        self.payload.filter(|payload| payload.matches(game_id, round))
    }

    fn emit(&mut self, kind: LifecycleKind) {
        info!(
            event = %kind,
            game_id = %self.state.current_game_id,
            round = self.state.current_round,
            recorded = self.state.recorded_rounds(),
            "lifecycle event"
        );
        self.events.push(LifecycleEvent::new(kind, &self.state));
    }

    fn start_round(&mut self, facts: &PageFacts) {
        // Round 1 over already-recorded rounds is a replay, even when a reload has
        // reset the round counter to 0.
        let new_session = facts.game_id != self.state.current_game_id
            || facts.round < self.state.current_round
            || (facts.round == 1 && !self.state.rounds.is_empty());
        if new_session {
            if !self.state.current_game_id.is_empty() {
                debug!(
                    previous = %self.state.current_game_id,
                    next = %facts.game_id,
                    "new session; discarding previous state"
                );
            }
            self.state = GameState::default();
        }

        self.state.current_round = facts.round;
        self.state.round_in_progress = true;
        self.state.game_in_progress = true;
        self.state.current_game_id = facts.game_id.clone();
        self.state.is_challenge_link = facts.mode.is_challenge();
        self.mutated = true;

        if let Some(map) = self.lookup().and_then(GamePayload::map_info) {
            self.state.map = map;
        }

        if self.state.current_round == 1 {
            self.emit(LifecycleKind::GameStart);
        }
        self.emit(LifecycleKind::RoundStart);
    }

    fn stop_round(&mut self) {
        self.state.round_in_progress = false;
        self.mutated = true;
        let round = self.state.current_round;

        match self.lookup() {
            Some(payload) => {
                if round > self.rules.total_rounds {
                    warn!(round, total = self.rules.total_rounds, "round beyond game length; not recorded");
                } else if let Some(record) = payload.round_record(round) {
                    self.state.set_round(round, record);
                } else {
                    warn!(round, "payload has no complete entry for round; not recorded");
                }
                if let Some(totals) = payload.totals() {
                    self.state.total_score = totals.score;
                    self.state.total_distance = totals.distance;
                }
                if let Some(map) = payload.map_info() {
                    self.state.map = map;
                }
            }
            None => warn!(
                game_id = %self.state.current_game_id,
                round,
                "no matching payload when round ended; round not recorded"
            ),
        }

        self.emit(LifecycleKind::RoundEnd);
        if round == self.rules.total_rounds {
            self.emit(LifecycleKind::GameEnd);
        }
    }

    fn finish(self) -> Reconciled {
        Reconciled {
            state: self.state,
            events: self.events,
            mutated: self.mutated,
        }
    }
}
