//! Stateful driver around [`reconcile`](crate::reconcile::reconcile).
//!
//! The engine owns the single [`GameState`], reads the page and the tap once per pass,
//! persists after every mutating pass and publishes the resulting lifecycle events.

use std::sync::Arc;

use network_tap_light::{PayloadTap, TapConfig, TapError};
use perceiver_structural::PageReader;
use roundwatch_core_types::{GameState, LifecycleEvent};
use roundwatch_event_bus::{EventBus, InMemoryBus};
use roundwatch_state_center::{MemorySlots, StateSlot, StateStore};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_EVENT_BUFFER, DEFAULT_STORAGE_KEY};
use crate::reconcile::{phase, reconcile, Phase, Rules};

pub type LifecycleBus = InMemoryBus<LifecycleEvent>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Tap(#[from] TapError),
}

/// One "the page changed" notification. `mutations` is informational only; every
/// notification triggers exactly one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageChanged {
    pub mutations: usize,
}

pub struct EngineBuilder {
    rules: Rules,
    storage_key: String,
    event_buffer: usize,
    tap_config: TapConfig,
    tap: Option<Arc<PayloadTap>>,
    slot: Option<Arc<dyn StateSlot>>,
    bus: Option<Arc<LifecycleBus>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            tap_config: TapConfig::default(),
            tap: None,
            slot: None,
            bus: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            rules: config.rules(),
            storage_key: config.storage_key.clone(),
            event_buffer: config.event_buffer,
            tap_config: config.tap.clone(),
            ..Self::default()
        }
    }

    pub fn rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Shares an existing tap, typically the one a [`TappedClient`] feeds.
    ///
    /// [`TappedClient`]: network_tap_light::TappedClient
    pub fn tap(mut self, tap: Arc<PayloadTap>) -> Self {
        self.tap = Some(tap);
        self
    }

    pub fn slot(mut self, slot: Arc<dyn StateSlot>) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn bus(mut self, bus: Arc<LifecycleBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build<R: PageReader>(self, reader: R) -> Result<ReconciliationEngine<R>, EngineError> {
        let tap = match self.tap {
            Some(tap) => tap,
            None => Arc::new(PayloadTap::new(self.tap_config)?),
        };
        let slot = self
            .slot
            .unwrap_or_else(|| Arc::new(MemorySlots::new()) as Arc<dyn StateSlot>);
        let bus = self
            .bus
            .unwrap_or_else(|| LifecycleBus::new(self.event_buffer));
        Ok(ReconciliationEngine::new(
            reader,
            tap,
            StateStore::new(slot, self.storage_key),
            self.rules,
            bus,
        ))
    }
}

pub struct ReconciliationEngine<R: PageReader> {
    reader: R,
    tap: Arc<PayloadTap>,
    store: StateStore,
    bus: Arc<LifecycleBus>,
    rules: Rules,
    state: GameState,
    passes: u64,
}

impl<R: PageReader> ReconciliationEngine<R> {
    /// Restores any persisted state (with the reload reset applied) and writes it back
    /// immediately. An unreadable slot is logged and replaced by a fresh state.
    pub fn new(
        reader: R,
        tap: Arc<PayloadTap>,
        store: StateStore,
        rules: Rules,
        bus: Arc<LifecycleBus>,
    ) -> Self {
        let mut engine = Self {
            reader,
            tap,
            store,
            bus,
            rules,
            state: GameState::default(),
            passes: 0,
        };
        engine.restore();
        engine
    }

    fn restore(&mut self) {
        match self.store.load() {
            Ok(Some(state)) => {
                info!(
                    key = %self.store.key(),
                    game_id = %state.current_game_id,
                    recorded = state.recorded_rounds(),
                    "restored persisted game state"
                );
                self.state = state;
                self.persist();
            }
            Ok(None) => debug!(key = %self.store.key(), "starting with a fresh game state"),
            Err(err) => warn!(
                key = %self.store.key(),
                error = %err,
                "persisted game state unreadable; starting fresh"
            ),
        }
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.state) {
            warn!(key = %self.store.key(), error = %err, "failed to persist game state");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.bus.subscribe()
    }

    pub fn bus(&self) -> &Arc<LifecycleBus> {
        &self.bus
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        phase(&self.state, &self.rules)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn tap(&self) -> &Arc<PayloadTap> {
        &self.tap
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Runs one reconciliation pass and returns the events it published, in order.
    pub fn on_page_changed(&mut self) -> Vec<LifecycleEvent> {
        self.passes += 1;
        let facts = self.reader.facts();
        let cached = self.tap.latest();
        let payload = cached.as_ref().and_then(|captured| captured.game.as_ref());

        let outcome = reconcile(&self.state, &facts, payload, &self.rules);
        if !outcome.mutated {
            return Vec::new();
        }

        self.state = outcome.state;
        self.persist();
        for event in &outcome.events {
            let delivered = self.bus.publish(event.clone());
            debug!(event = %event.kind, delivered, "lifecycle event published");
        }
        outcome.events
    }

    /// Runs one pass per notification until the channel closes or `shutdown` fires,
    /// then hands back the final state.
    pub async fn run(
        mut self,
        mut changes: mpsc::Receiver<PageChanged>,
        shutdown: CancellationToken,
    ) -> GameState {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("engine shutdown requested");
                    break;
                }
                change = changes.recv() => match change {
                    Some(change) => {
                        debug!(mutations = change.mutations, "page changed");
                        self.on_page_changed();
                    }
                    None => break,
                },
            }
        }
        info!(passes = self.passes, phase = ?self.phase(), "engine stopped");
        self.state
    }
}
