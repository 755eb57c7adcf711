//! Configuration management for the asset engine.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/asset-engine/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("allowed_files is not a valid glob pattern {pattern}: {reason}")]
    InvalidAllowedFiles { pattern: String, reason: String },

    #[error("{field} must be an absolute URL, got {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the asset engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// General engine configuration.
    pub engine: EngineConfig,

    /// Asset resolution configuration.
    pub assets: AssetsConfig,
}

/// General engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory relative asset links are resolved against.
    pub root_directory: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Asset resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AssetsConfig {
    /// Glob pattern of files that may be read from disk. Unset denies all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_files: Option<String>,

    /// Read the asset name as a file path when no store record matches.
    pub search_on_disk_if_not_found_in_store: bool,

    /// Query the store without scoping to the requesting principal.
    pub public_access_enabled: bool,

    /// Base URL for `link` encoded assets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_url_for_links: Option<String>,

    /// Base URL of the local HTTP server, used for links when the request
    /// carries no base URL of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_directory: default_root_directory(),
            log_level: "info".to_string(),
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asset-engine")
        .join("config.toml")
}

/// Returns the default root directory for relative links.
fn default_root_directory() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - ASSET_ENGINE_ALLOWED_FILES: Override the allowed files glob
    /// - ASSET_ENGINE_ROOT_DIRECTORY: Override the link root directory
    /// - ASSET_ENGINE_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(pattern) = std::env::var("ASSET_ENGINE_ALLOWED_FILES") {
            if !pattern.is_empty() {
                tracing::info!("Overriding allowed_files from environment: {}", pattern);
                self.assets.allowed_files = Some(pattern);
            }
        }

        if let Ok(root) = std::env::var("ASSET_ENGINE_ROOT_DIRECTORY") {
            if !root.is_empty() {
                tracing::info!("Overriding root_directory from environment: {}", root);
                self.engine.root_directory = PathBuf::from(root);
            }
        }

        if let Ok(level) = std::env::var("ASSET_ENGINE_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.engine.log_level = level;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.engine.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.engine.log_level.clone()));
        }

        if let Some(pattern) = &self.assets.allowed_files {
            globset::Glob::new(pattern).map_err(|e| ConfigError::InvalidAllowedFiles {
                pattern: pattern.clone(),
                reason: e.kind().to_string(),
            })?;
        }

        validate_url("root_url_for_links", self.assets.root_url_for_links.as_deref())?;
        validate_url("local_base_url", self.assets.local_base_url.as_deref())?;

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(value) if url::Url::parse(value).is_err() => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.engine.log_level, "info");
        assert!(config.assets.allowed_files.is_none());
        assert!(!config.assets.search_on_disk_if_not_found_in_store);
        assert!(!config.assets.public_access_enabled);
        assert!(config.assets.root_url_for_links.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[engine]
root_directory = "/srv/reports"
log_level = "debug"

[assets]
allowed_files = "**/*.html"
search_on_disk_if_not_found_in_store = true
public_access_enabled = true
root_url_for_links = "https://cdn.example.com/"
local_base_url = "http://localhost:5488"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.engine.root_directory, PathBuf::from("/srv/reports"));
        assert_eq!(config.engine.log_level, "debug");
        assert_eq!(config.assets.allowed_files.as_deref(), Some("**/*.html"));
        assert!(config.assets.search_on_disk_if_not_found_in_store);
        assert!(config.assets.public_access_enabled);
        assert_eq!(
            config.assets.root_url_for_links.as_deref(),
            Some("https://cdn.example.com/")
        );
        assert_eq!(
            config.assets.local_base_url.as_deref(),
            Some("http://localhost:5488")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Config::from_toml("[assets\nallowed_files = 1");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let toml = r#"
[assets]
public_access_enabled = "yes"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.engine.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );

        config.engine.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_allowed_files() {
        let mut config = Config::default();
        config.assets.allowed_files = Some("**/[unclosed".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAllowedFiles { .. })
        ));
    }

    #[test]
    fn test_validate_urls() {
        let mut config = Config::default();
        config.assets.root_url_for_links = Some("not a url".to_string());
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                field: "root_url_for_links",
                value: "not a url".to_string(),
            })
        );

        config.assets.root_url_for_links = None;
        config.assets.local_base_url = Some("/relative".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                field: "local_base_url",
                ..
            })
        ));
    }

    #[test]
    fn test_roundtrip_custom() {
        let mut original = Config::default();
        original.engine.log_level = "warn".to_string();
        original.assets.allowed_files = Some("assets/**".to_string());
        original.assets.root_url_for_links = Some("https://cdn.example.com/".to_string());

        let toml = original.to_toml().unwrap();
        let loaded = Config::from_toml(&toml).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.assets.search_on_disk_if_not_found_in_store = true;

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let err = Config::load(&config_path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("asset-engine"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("ASSET_ENGINE_ALLOWED_FILES", "**/*.css");
        std::env::set_var("ASSET_ENGINE_ROOT_DIRECTORY", "/opt/assets");
        std::env::set_var("ASSET_ENGINE_LOG_LEVEL", "trace");

        let mut config = Config::default();
        config.apply_env_overrides();

        std::env::remove_var("ASSET_ENGINE_ALLOWED_FILES");
        std::env::remove_var("ASSET_ENGINE_ROOT_DIRECTORY");
        std::env::remove_var("ASSET_ENGINE_LOG_LEVEL");

        assert_eq!(config.assets.allowed_files.as_deref(), Some("**/*.css"));
        assert_eq!(config.engine.root_directory, PathBuf::from("/opt/assets"));
        assert_eq!(config.engine.log_level, "trace");
    }

    #[test]
    #[serial]
    fn test_env_overrides_ignore_empty() {
        std::env::set_var("ASSET_ENGINE_LOG_LEVEL", "");

        let mut config = Config::default();
        config.apply_env_overrides();

        std::env::remove_var("ASSET_ENGINE_LOG_LEVEL");

        assert_eq!(config.engine.log_level, "info");
    }
}
