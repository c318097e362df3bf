use std::time::Duration;

use serde::Deserialize;

/// Dispatch worker configuration.
///
/// # Example
///
/// ```toml
/// [dispatch]
/// timeout_seconds = 10
/// max_concurrent = 8
/// queue_capacity = 256
/// ```
#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    /// Time bound for a single provider call.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of subscribers dispatched concurrently.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Capacity of the subscriber-created event queue. Events beyond it are
    /// dropped with a warning.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    16
}

fn default_queue_capacity() -> usize {
    1024
}
