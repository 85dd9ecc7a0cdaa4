//! Persistence for the reconstructed game state.
//!
//! A [`StateSlot`] is a plain string key-value capability (last write wins); a
//! [`StateStore`] binds one key of a slot to the JSON form of [`GameState`] and applies
//! the reload rules on the way in.

pub mod slots;

use std::sync::Arc;

use roundwatch_core_types::GameState;
use thiserror::Error;
use tracing::debug;

pub use slots::{FileSlots, MemorySlots};

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("io failure: {0}")]
    Io(String),
    #[error("stored state under `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("encode failure: {0}")]
    Encode(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// String key-value persistence with no transactional guarantees.
pub trait StateSlot: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: StateSlot + ?Sized> StateSlot for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

pub struct StateStore {
    slot: Arc<dyn StateSlot>,
    key: String,
}

impl StateStore {
    pub fn new(slot: Arc<dyn StateSlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restores the persisted state. Missing fields take their defaults, unknown fields
    /// are dropped, and the transient round/game flags are always reset so that a
    /// reload never resumes mid-round.
    pub fn load(&self) -> Result<Option<GameState>, StoreError> {
        let Some(raw) = self.slot.read(&self.key)? else {
            debug!(key = %self.key, "no persisted state");
            return Ok(None);
        };
        let mut value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| corrupt(&self.key, err))?;
        let Some(fields) = value.as_object_mut() else {
            return Err(StoreError::Corrupt {
                key: self.key.clone(),
                reason: "expected a JSON object".to_string(),
            });
        };
        // Reset fields are never decoded, so a bad value there cannot sink the rest.
        for field in TRANSIENT_FIELDS {
            fields.remove(*field);
        }
        let mut state: GameState =
            serde_json::from_value(value).map_err(|err| corrupt(&self.key, err))?;
        state.reset_transient();
        Ok(Some(state))
    }

    /// The persisted state exactly as stored, without the reload reset.
    pub fn peek(&self) -> Result<Option<GameState>, StoreError> {
        match self.slot.read(&self.key)? {
            Some(raw) => decode(&self.key, &raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn save(&self, state: &GameState) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(state).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.slot.write(&self.key, &raw)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.slot.remove(&self.key)
    }
}

const TRANSIENT_FIELDS: &[&str] = &["current_round", "round_in_progress", "game_in_progress"];

fn decode(key: &str, raw: &str) -> Result<GameState, StoreError> {
    serde_json::from_str(raw).map_err(|err| corrupt(key, err))
}

fn corrupt(key: &str, err: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    }
}
