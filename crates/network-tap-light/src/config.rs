//! Configuration types for the network tap (light).

use serde::{Deserialize, Serialize};

/// Matches the game and challenge data endpoints, e.g. `/api/v3/games/<token>`.
pub const DEFAULT_ENDPOINT_PATTERN: &str = r"/api/v3/(games|challenges)/[^/?#]+";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Regex searched (not anchored) in the request URL.
    pub endpoint_pattern: String,
    /// Only cache responses with a 2xx status.
    pub success_only: bool,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            endpoint_pattern: DEFAULT_ENDPOINT_PATTERN.to_string(),
            success_only: true,
        }
    }
}
