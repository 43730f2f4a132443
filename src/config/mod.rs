//! Configuration management for hitcount
//!
//! Settings are layered:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use hitcount::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Counting hits over {}", config.window.length);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `HITCOUNT__<section>__<key>`:
//! - `HITCOUNT__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `HITCOUNT__WINDOW__LENGTH=1m`
//! - `HITCOUNT__DURABILITY__STRATEGY=snapshot`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/hitcount.toml`.
//! This can be overridden using the `HITCOUNT_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::{ByteSize, HumanDuration};
pub use models::{
    Config, DurabilityConfig, DurabilityStrategy, JournalConfig, LogFormat, ServerConfig,
    SnapshotConfig, TelemetryConfig, VacuumMode, WindowConfig,
};
pub use sources::config_path;
pub use validation::ValidationError;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file plus environment overrides
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path.as_ref())?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[window]\nlength = \"45s\"\n").unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config.window.length.to_string(), "45s");
        assert_eq!(config.durability.strategy, DurabilityStrategy::Journal);
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[journal]
path = "data/state"

[snapshot]
path = "data/state"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::SharedPath { .. })
        ));
    }

    #[test]
    fn test_rendered_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rendered.toml");

        let mut config = Config::default();
        config.window.length = HumanDuration::from_secs(90);
        config.journal.buffer_capacity = ByteSize(4096);
        fs::write(&config_path, config.to_toml().unwrap()).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap();
        assert_eq!(loaded.window.length, HumanDuration::from_secs(90));
        assert_eq!(loaded.journal.buffer_capacity, ByteSize(4096));
    }
}
