//! Notification outbox drain configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background outbox drain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxConfig {
    /// Whether the background drain worker runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between drain passes.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum intents delivered per pass.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Delay before redelivering an intent after its first failure.
    #[serde(default = "default_redelivery_initial_backoff")]
    pub redelivery_initial_backoff_ms: u64,
    /// Cap on the redelivery delay.
    #[serde(default = "default_redelivery_max_backoff")]
    pub redelivery_max_backoff_ms: u64,
}

impl OutboxConfig {
    /// Delay before the next attempt of an intent that has failed
    /// `attempts` times. Doubles per failure up to the cap.
    pub fn redelivery_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 32) as u32;
        let delay_ms = self
            .redelivery_initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.redelivery_max_backoff_ms);
        Duration::from_millis(delay_ms)
    }
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            redelivery_initial_backoff_ms: default_redelivery_initial_backoff(),
            redelivery_max_backoff_ms: default_redelivery_max_backoff(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}

fn default_batch_size() -> u32 {
    100
}

fn default_redelivery_initial_backoff() -> u64 {
    1_000
}

fn default_redelivery_max_backoff() -> u64 {
    300_000
}
