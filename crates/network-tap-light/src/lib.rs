//! Network tap (light).
//!
//! Watches responses from the game and challenge data endpoints and keeps the most
//! recent one in a single slot. The engine reads that slot synchronously on every
//! reconciliation pass; nothing here ever alters what the page's own caller receives.

pub mod client;
pub mod config;
pub mod payload;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

pub use client::{HttpClient, HttpRequest, HttpResponse, TappedClient};
pub use config::TapConfig;
pub use payload::{GamePayload, Totals};

/// Errors emitted by the tap surface.
#[derive(Clone, Debug, Error)]
pub enum TapError {
    #[error("invalid endpoint pattern: {0}")]
    InvalidPattern(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A response body copied off the wire.
#[derive(Clone, Debug)]
pub struct CapturedPayload {
    pub url: String,
    pub body: serde_json::Value,
    pub captured_at: DateTime<Utc>,
    /// Present when the body has the game payload shape.
    pub game: Option<GamePayload>,
}

impl CapturedPayload {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        let game = serde_json::from_value(body.clone()).ok();
        Self {
            url: url.into(),
            body,
            captured_at: Utc::now(),
            game,
        }
    }

    pub fn matches(&self, game_id: &str, round: u32) -> bool {
        self.game
            .as_ref()
            .map(|game| game.matches(game_id, round))
            .unwrap_or(false)
    }
}

/// Single-slot cache of the latest matching payload.
pub struct PayloadTap {
    pattern: Regex,
    config: TapConfig,
    slot: RwLock<Option<Arc<CapturedPayload>>>,
    captured: AtomicU64,
}

impl PayloadTap {
    pub fn new(config: TapConfig) -> Result<Self, TapError> {
        let pattern = Regex::new(&config.endpoint_pattern)
            .map_err(|err| TapError::InvalidPattern(err.to_string()))?;
        Ok(Self {
            pattern,
            config,
            slot: RwLock::new(None),
            captured: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Records a response if `url` is a data endpoint, the status is acceptable and the
    /// body is JSON. Returns whether the slot was replaced.
    pub fn observe(&self, url: &str, status: u16, body: &[u8]) -> bool {
        if !self.matches(url) {
            return false;
        }
        if self.config.success_only && !(200..300).contains(&status) {
            debug!(%url, status, "skipping unsuccessful data response");
            return false;
        }
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => {
                self.store(CapturedPayload::new(url, value));
                true
            }
            Err(err) => {
                debug!(%url, ?err, "data response body is not JSON");
                false
            }
        }
    }

    /// Replaces the slot unconditionally; latest wins.
    pub fn store(&self, payload: CapturedPayload) {
        *self.slot.write() = Some(Arc::new(payload));
        self.captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn latest(&self) -> Option<Arc<CapturedPayload>> {
        self.slot.read().clone()
    }

    /// The cached payload, but only if it was produced for exactly this game and round.
    pub fn payload_for(&self, game_id: &str, round: u32) -> Option<Arc<CapturedPayload>> {
        self.latest()
            .filter(|payload| payload.matches(game_id, round))
    }

    /// Number of payloads stored since construction.
    pub fn captured_count(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }
}
