//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for consensus runs
///
/// Loaded from the `[consensus]` section of the router config.
///
/// # Examples
///
/// ```
/// use verity_consensus::ConsensusConfig;
///
/// let config = ConsensusConfig::default();
/// assert_eq!(config.lens_timeout_ms, 5000);
/// assert_eq!(config.store_retries, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Upper bound on a single lens evaluation (milliseconds)
    #[serde(default = "default_lens_timeout_ms")]
    pub lens_timeout_ms: u64,

    /// How many times a transient store failure is retried
    #[serde(default = "default_store_retries")]
    pub store_retries: u32,

    /// Base backoff between retries (milliseconds), multiplied by attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Best-score threshold below which a claim counts as disputed
    #[serde(default = "default_disputed_threshold")]
    pub disputed_threshold: f64,

    /// Claims with more active counterclaims than this are disputed
    #[serde(default = "default_counterclaim_floor")]
    pub disputed_counterclaim_floor: usize,
}

fn default_lens_timeout_ms() -> u64 {
    5000
}

fn default_store_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    25
}

fn default_disputed_threshold() -> f64 {
    0.3
}

fn default_counterclaim_floor() -> usize {
    2
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            lens_timeout_ms: default_lens_timeout_ms(),
            store_retries: default_store_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            disputed_threshold: default_disputed_threshold(),
            disputed_counterclaim_floor: default_counterclaim_floor(),
        }
    }
}

impl ConsensusConfig {
    /// Lens timeout as a Duration
    pub fn lens_timeout(&self) -> Duration {
        Duration::from_millis(self.lens_timeout_ms)
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.lens_timeout_ms == 0 {
            return Err("lens_timeout_ms must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.disputed_threshold) {
            return Err(format!(
                "disputed_threshold must be within [0, 1], got {}",
                self.disputed_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_section() {
        let config: ConsensusConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConsensusConfig::default());
        assert_eq!(config.lens_timeout(), Duration::from_secs(5));
        assert_eq!(config.backoff(2), Duration::from_millis(50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ConsensusConfig {
            lens_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
