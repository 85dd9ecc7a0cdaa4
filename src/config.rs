//! Runtime configuration.
//!
//! Every field defaults, so a partial YAML file (or none at all) is a valid config.

use std::env;
use std::path::PathBuf;

use network_tap_light::{PayloadTap, TapConfig, TapError};
use perceiver_structural::{PerceiverError, SelectorSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::reconcile::{Rules, DEFAULT_TOTAL_ROUNDS};

/// Slot key the reconstructed state is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "GeoGuessrEventFramework_STATE";
pub const DEFAULT_EVENT_BUFFER: usize = 64;

pub const ENV_STATE_DIR: &str = "ROUNDWATCH_STATE_DIR";
pub const ENV_TOTAL_ROUNDS: &str = "ROUNDWATCH_TOTAL_ROUNDS";
pub const ENV_STORAGE_KEY: &str = "ROUNDWATCH_STORAGE_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Selector(#[from] PerceiverError),
    #[error(transparent)]
    Tap(#[from] TapError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage_key: String,
    pub total_rounds: u32,
    /// Directory holding one JSON file per storage key.
    pub state_dir: PathBuf,
    /// Capacity of the lifecycle broadcast channel.
    pub event_buffer: usize,
    pub tap: TapConfig,
    pub selectors: SelectorSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            state_dir: default_state_dir(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            tap: TapConfig::default(),
            selectors: SelectorSet::default(),
        }
    }
}

impl Config {
    pub fn rules(&self) -> Rules {
        Rules {
            total_rounds: self.total_rounds,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage_key",
                reason: "must not be empty".into(),
            });
        }
        if self.total_rounds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "total_rounds",
                reason: "a game has at least one round".into(),
            });
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_buffer",
                reason: "must be at least 1".into(),
            });
        }
        self.selectors.compile()?;
        PayloadTap::new(self.tap.clone())?;
        Ok(())
    }

    /// Applies `ROUNDWATCH_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = env::var(ENV_STATE_DIR) {
            info!(%dir, "state directory overridden from environment");
            self.state_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = env::var(ENV_TOTAL_ROUNDS) {
            self.total_rounds = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "total_rounds",
                reason: format!("{ENV_TOTAL_ROUNDS}={raw} is not a round count"),
            })?;
            info!(total_rounds = self.total_rounds, "game length overridden from environment");
        }
        if let Ok(key) = env::var(ENV_STORAGE_KEY) {
            self.storage_key = key;
        }
        Ok(())
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roundwatch")
}
