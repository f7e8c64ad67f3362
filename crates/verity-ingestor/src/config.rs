//! Configuration for signal ingestion

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the signal ingestor and its worker
///
/// # Examples
///
/// ```
/// use verity_ingestor::IngestorConfig;
///
/// let config = IngestorConfig::default();
/// assert_eq!(config.queue_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestorConfig {
    /// Bounded queue size in front of the worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Retries for transient store failures
    #[serde(default = "default_store_retries")]
    pub store_retries: u32,

    /// Base backoff between retries (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_queue_capacity() -> usize {
    256
}

fn default_store_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    25
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            store_retries: default_store_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl IngestorConfig {
    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}
