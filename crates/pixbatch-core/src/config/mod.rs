//! Configuration management for pixbatch.
//!
//! Configuration is loaded from a platform config directory
//! (`pixbatch/config.toml`) with sensible defaults. All config structs
//! implement `Default` and tolerate partial files via `#[serde(default)]`.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for pixbatch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery and transform settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output naming and encoding settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.pixbatch.pixbatch/config.toml
    /// - Linux: ~/.config/pixbatch/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pixbatch\config\config.toml
    ///
    /// Falls back to ~/.pixbatch/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "pixbatch", "pixbatch")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pixbatch").join("config.toml")
            })
    }

    /// Get the resolved error log path (with ~ expansion).
    pub fn error_log_path(&self) -> PathBuf {
        let path_str = self.output.error_log.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.supported_formats.len(), 7);
        assert_eq!(config.limits.max_image_dimension, 10000);
        assert_eq!(config.output.jpeg_quality, 90);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[output]"));
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\njpeg_quality = 75\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output.jpeg_quality, 75);
        // Untouched sections keep their defaults
        assert_eq!(config.processing.crop_ratio, 0.88);
    }

    #[test]
    fn test_load_from_rejects_bad_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[processing]\ncrop_ratio = 1.5\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
