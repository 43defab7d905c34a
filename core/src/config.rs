//! Configuration for port discovery and process termination.
//!
//! Stores configuration in JSON format at `~/.rbportkiller/config.json`.
//! Every field has a default, so a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Program that prints the connection table with owning PIDs.
    #[serde(default = "default_diagnostic_command")]
    pub diagnostic_command: String,

    /// Arguments passed to the diagnostic program.
    #[serde(default = "default_diagnostic_args")]
    pub diagnostic_args: Vec<String>,

    /// Upper bound for a cooperative termination, in seconds.
    #[serde(default = "default_termination_timeout_secs")]
    pub termination_timeout_secs: u64,

    /// How often a wait checks for cancellation, in milliseconds.
    #[serde(default = "default_wait_poll_interval_ms")]
    pub wait_poll_interval_ms: u64,
}

fn default_diagnostic_command() -> String {
    "netstat".to_string()
}

fn default_diagnostic_args() -> Vec<String> {
    vec!["-ano".to_string()]
}

fn default_termination_timeout_secs() -> u64 {
    5
}

fn default_wait_poll_interval_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            diagnostic_command: default_diagnostic_command(),
            diagnostic_args: default_diagnostic_args(),
            termination_timeout_secs: default_termination_timeout_secs(),
            wait_poll_interval_ms: default_wait_poll_interval_ms(),
        }
    }
}

impl Config {
    pub fn termination_timeout(&self) -> Duration {
        Duration::from_secs(self.termination_timeout_secs)
    }

    /// Poll interval, never zero.
    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms.max(1))
    }
}

/// Reads and writes [`Config`] on disk.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a config store with the default path, `~/.rbportkiller/config.json`.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".rbportkiller").join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk, creating the directory if needed.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to a sibling temp file, then rename over the target
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let config = store.load().await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.diagnostic_command, "netstat");
        assert_eq!(config.diagnostic_args, vec!["-ano"]);
        assert_eq!(config.termination_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::with_path(dir.path().join("nested").join("config.json"));

        let config = Config {
            termination_timeout_secs: 10,
            wait_poll_interval_ms: 250,
            ..Config::default()
        };
        store.save(&config).await.unwrap();

        assert_eq!(store.load().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        fs::write(store.path(), r#"{ "terminationTimeoutSecs": 2 }"#)
            .await
            .unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.termination_timeout_secs, 2);
        assert_eq!(config.diagnostic_command, "netstat");
        assert_eq!(config.wait_poll_interval_ms, 100);
    }

    #[tokio::test]
    async fn test_malformed_file_is_config_error() {
        let (store, _dir) = test_store();
        fs::write(store.path(), "{ not json").await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unwritable_location_is_config_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").await.unwrap();

        let store = ConfigStore::with_path(blocker.join("config.json"));
        let err = store.save(&Config::default()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("config directory"));
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["diagnosticCommand"], "netstat");
        assert_eq!(json["waitPollIntervalMs"], 100);
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = Config {
            wait_poll_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.wait_poll_interval(), Duration::from_millis(1));
    }
}
