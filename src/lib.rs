//! Roundwatch library
//!
//! Reconstructs the progress of a round-based guessing game from two passive signals:
//! snapshots of the page and the game data payloads the page fetches. Consumers
//! subscribe to `game_start`, `round_start`, `round_end` and `game_end` notifications.

pub mod config;
pub mod engine;
pub mod reconcile;
pub mod trace;

pub use config::{Config, ConfigError};
pub use engine::{EngineBuilder, EngineError, LifecycleBus, PageChanged, ReconciliationEngine};
pub use reconcile::{phase, reconcile, Phase, Reconciled, Rules};
pub use trace::{Replayer, ReplayReport, Trace, TraceError};

pub use network_tap_light::{GamePayload, PayloadTap, TapConfig, TappedClient};
pub use perceiver_structural::{ObservedPage, PageFacts, PageReader, SelectorSet};
pub use roundwatch_core_types::{GameMode, GameState, LifecycleEvent, LifecycleKind};
pub use roundwatch_state_center::{FileSlots, MemorySlots, StateSlot, StateStore};
