//! Feed configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the feed manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// How long a local like/save write suppresses its echo from the
    /// change feed, in milliseconds (default: 5000)
    #[serde(default = "default_echo_window_ms")]
    pub echo_window_ms: u64,
}

fn default_echo_window_ms() -> u64 {
    5_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            echo_window_ms: default_echo_window_ms(),
        }
    }
}

impl FeedConfig {
    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}
