//! Configuration management for the pageweave loader.
//!
//! Handles loading, validation, and defaults for the YAML configuration
//! that drives a `Loader` instance: the document root the resolver
//! confines itself to, the nesting bound shared by the inclusion and
//! macro-expansion passes, and the logging level.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure for a `Loader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document root every resolved path is confined to.
    pub root: PathBuf,
    /// Shared nesting bound for inclusion recursion and macro expansion
    /// recursion (independent counters, same default).
    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_nesting() -> usize {
    100
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = serde_yaml::from_str(&content).map_err(|_| ConfigError::InvalidYaml)?;
        config.validate()?;
        Ok(config)
    }

    /// A config pointing at `root` with every other field defaulted.
    /// Handy for tests and for the CLI's `--root` shortcut.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), max_nesting: default_max_nesting(), logging: LoggingConfig::default() }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_nesting".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if !self.root.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "root".to_string(),
                reason: format!("\"{}\" is not a directory", self.root.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_max_nesting_is_one_hundred() {
        let config = Config::for_root(std::env::temp_dir());
        assert_eq!(config.max_nesting, 100);
    }

    #[test]
    fn validate_rejects_zero_max_nesting() {
        let mut config = Config::for_root(std::env::temp_dir());
        config.max_nesting = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = Config::load("/no/such/config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
