//! Configuration file parsing for the Router.
//!
//! Loads settings from TOML files: bind address, database path, session
//! secrets, the engine signing key, validation preset, and the
//! `[consensus]` and `[ingestor]` sections.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use verity_consensus::ConsensusConfig;
use verity_gatekeeper::ValidationConfig;
use verity_ingestor::IngestorConfig;

/// Router configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A field holds an unusable value
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Router configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// SQLite database path (`:memory:` for a throwaway store)
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// Secret that upgrades a session to the admin role
    pub admin_secret: String,

    /// Token expiry in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// Hex-encoded Ed25519 secret key for transparency records; an
    /// ephemeral key is generated when absent
    #[serde(default)]
    pub signing_key_hex: Option<String>,

    /// Validation preset: "default", "permissive" or "strict"
    #[serde(default = "default_validation_preset")]
    pub validation_preset: String,

    /// Orchestrator settings
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// Signal ingestor settings
    #[serde(default)]
    pub ingestor: IngestorConfig,
}

/// Default token expiry: 1 hour
fn default_token_expiry() -> u64 {
    3600
}

fn default_database_path() -> String {
    "verity.db".to_string()
}

fn default_validation_preset() -> String {
    "default".to_string()
}

impl RouterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RouterConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and section values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }
        if self.admin_secret.is_empty() {
            return Err(ConfigError::MissingField("admin_secret".to_string()));
        }
        self.validation()?;
        self.consensus.validate().map_err(ConfigError::Invalid)?;
        self.ingestor.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Resolve the validation preset
    pub fn validation(&self) -> Result<ValidationConfig, ConfigError> {
        ValidationConfig::preset(&self.validation_preset).ok_or_else(|| {
            ConfigError::Invalid(format!("unknown validation preset '{}'", self.validation_preset))
        })
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        RouterConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            admin_secret: "test-admin-secret".to_string(),
            token_expiry_secs: 3600,
            signing_key_hex: None,
            validation_preset: default_validation_preset(),
            consensus: ConsensusConfig::default(),
            ingestor: IngestorConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.token_expiry_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = RouterConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            database_path = "/var/lib/verity/verity.db"
            jwt_secret = "my-secret"
            admin_secret = "let-me-in"
            validation_preset = "strict"

            [consensus]
            lens_timeout_ms = 2000

            [ingestor]
            queue_capacity = 64
        "#;

        let config: RouterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.token_expiry_secs, 3600);
        assert_eq!(config.consensus.lens_timeout_ms, 2000);
        assert_eq!(config.consensus.store_retries, 3);
        assert_eq!(config.ingestor.queue_capacity, 64);
        assert_eq!(config.validation().unwrap().max_topic_tags, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_preset() {
        let config = RouterConfig {
            validation_preset: "lenient".to_string(),
            ..RouterConfig::default_test_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_admin_secret() {
        let config = RouterConfig {
            admin_secret: String::new(),
            ..RouterConfig::default_test_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(f)) if f == "admin_secret"));
    }
}
