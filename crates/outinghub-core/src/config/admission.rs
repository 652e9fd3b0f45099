//! Admission engine configuration: per-outing locking and retry bounds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which store backs the admission engine and the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL with row-level locks on the outing row.
    #[default]
    Postgres,
    /// Process-local store, one mutex per outing. Single node only.
    Memory,
}

/// Admission engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Storage backend.
    #[serde(default)]
    pub storage: StorageBackend,
    /// Upper bound for acquiring the per-outing lock, in milliseconds.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// Retries for `Busy`/`Timeout`/`StorageFailure` before surfacing.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubles on each retry.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl AdmissionConfig {
    /// Lock acquisition bound as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            lock_timeout_ms: default_lock_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_lock_timeout() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    50
}

fn default_max_backoff() -> u64 {
    1000
}
