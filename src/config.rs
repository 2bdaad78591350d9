//! Configuration module for Rookery

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
///
/// The base URLs exist so tests (and self-hosted Graph API proxies) can point
/// connectors somewhere other than the production endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Organization whose database is used when no --org flag is given
    #[serde(default = "default_organization")]
    pub default_organization: String,

    /// Facebook/Instagram Graph API version segment
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,

    /// Facebook Graph API base URL (also serves Instagram business accounts)
    #[serde(default = "default_facebook_base_url")]
    pub facebook_base_url: String,

    /// LinkedIn REST API base URL
    #[serde(default = "default_linkedin_base_url")]
    pub linkedin_base_url: String,

    /// Threads Graph API base URL
    #[serde(default = "default_threads_base_url")]
    pub threads_base_url: String,

    /// Maximum simultaneously open organization databases
    #[serde(default = "default_cache_capacity")]
    pub connection_cache_capacity: usize,

    /// Seconds an idle organization database stays open
    #[serde(default = "default_cache_idle_secs")]
    pub connection_cache_idle_secs: u64,

    /// Scheduler poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Default platforms to target when composing (for cross-posting)
    #[serde(default)]
    pub default_post_platforms: Vec<String>,
}

fn default_organization() -> String {
    "default".to_string()
}

fn default_graph_api_version() -> String {
    "v18.0".to_string()
}

fn default_facebook_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_linkedin_base_url() -> String {
    "https://api.linkedin.com".to_string()
}

fn default_threads_base_url() -> String {
    "https://graph.threads.net".to_string()
}

fn default_cache_capacity() -> usize {
    5
}

fn default_cache_idle_secs() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_organization: default_organization(),
            graph_api_version: default_graph_api_version(),
            facebook_base_url: default_facebook_base_url(),
            linkedin_base_url: default_linkedin_base_url(),
            threads_base_url: default_threads_base_url(),
            connection_cache_capacity: default_cache_capacity(),
            connection_cache_idle_secs: default_cache_idle_secs(),
            poll_interval_secs: default_poll_interval(),
            default_post_platforms: Vec::new(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        crate::paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Facebook Graph API root including the version segment
    pub fn graph_url(&self) -> String {
        format!(
            "{}/{}",
            self.facebook_base_url.trim_end_matches('/'),
            self.graph_api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.connection_cache_capacity, 5);
        assert_eq!(config.connection_cache_idle_secs, 300);
        assert_eq!(config.graph_url(), "https://graph.facebook.com/v18.0");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_organization, "default");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.default_organization = "acme".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_organization, "acme");
    }
}
