//! Configuration module for crosspost

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::api::twitter::DEFAULT_ENDPOINT;
use crate::catalog::parse_platforms;
use crate::models::PlatformId;
use crate::paths;
use crate::scoring::ScoringRules;
use crate::validation::ValidationRules;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Platforms used when a command names none (comma separated ids are
    /// also accepted on the command line)
    #[serde(default = "default_platforms")]
    pub default_platforms: Vec<String>,

    /// Run platform attempts concurrently
    #[serde(default = "default_concurrent_dispatch")]
    pub concurrent_dispatch: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Create-tweet endpoint (override for proxies and tests)
    #[serde(default = "default_twitter_endpoint")]
    pub twitter_endpoint: String,

    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationRules,

    /// Authenticity scoring vocabulary
    #[serde(default)]
    pub scoring: ScoringRules,
}

fn default_platforms() -> Vec<String> {
    vec![PlatformId::Twitter.as_str().to_string()]
}

const fn default_concurrent_dispatch() -> bool {
    true
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_twitter_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_platforms: default_platforms(),
            concurrent_dispatch: default_concurrent_dispatch(),
            request_timeout_secs: default_request_timeout(),
            twitter_endpoint: default_twitter_endpoint(),
            validation: ValidationRules::default(),
            scoring: ScoringRules::default(),
        }
    }
}

impl Config {
    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&paths::config_path()?)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Default targets, with unknown ids dropped
    pub fn default_targets(&self) -> Vec<PlatformId> {
        parse_platforms(&self.default_platforms.join(","))
    }

    /// Request timeout as a [`Duration`]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_targets(), vec![PlatformId::Twitter]);
        assert!(config.concurrent_dispatch);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.twitter_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.validation.min_text_length, 5);
        assert!(!config.validation.enforce_character_limit);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.default_platforms = vec!["facebook".to_string(), "twitter".to_string()];
        config.concurrent_dispatch = false;
        config.validation.enforce_character_limit = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.default_targets(),
            vec![PlatformId::Facebook, PlatformId::Twitter]
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "request_timeout_secs = 5\n\n[validation]\nmin_text_length = 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.validation.min_text_length, 10);
        assert!(!config.validation.enforce_character_limit);
        assert_eq!(config.default_targets(), vec![PlatformId::Twitter]);
    }

    #[test]
    fn test_unknown_default_platform_dropped() {
        let config = Config {
            default_platforms: vec!["myspace".to_string(), "Snapchat".to_string()],
            ..Config::default()
        };
        assert_eq!(config.default_targets(), vec![PlatformId::Snapchat]);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "concurrent_dispatch = \"maybe\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
