//! Configuration module for the controller
//!
//! Supports YAML configuration files with module-based organization

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::emitter::DEFAULT_EVENT_CAPACITY;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Topology store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Leadership configuration
    #[serde(default)]
    pub leader: LeaderConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl ControllerConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to YAML file
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let yaml =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        std::fs::write(path, yaml).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(&mut self, other: ControllerConfig) {
        self.store.merge(other.store);
        self.storage.merge(other.storage);
        self.leader.merge(other.leader);
        self.log.merge(other.log);
    }
}

/// Topology store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Event channel capacity; overflowing events are dropped
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// Deadline for a single persistence commit in milliseconds
    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            commit_timeout_ms: default_commit_timeout_ms(),
        }
    }
}

impl StoreConfig {
    fn merge(&mut self, other: Self) {
        if other.event_channel_capacity > 0 {
            self.event_channel_capacity = other.event_channel_capacity;
        }
        if other.commit_timeout_ms > 0 {
            self.commit_timeout_ms = other.commit_timeout_ms;
        }
    }

    /// Get commit timeout as Duration
    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data storage directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, other: Self) {
        if !other.data_dir.as_os_str().is_empty() {
            self.data_dir = other.data_dir;
        }
    }
}

/// Leadership configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderConfig {
    /// Consider this process the leader without an external election
    #[serde(default = "default_standalone")]
    pub standalone: bool,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            standalone: default_standalone(),
        }
    }
}

impl LeaderConfig {
    /// Standalone only if every layer allows it
    fn merge(&mut self, other: Self) {
        self.standalone &= other.standalone;
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogConfig {
    fn merge(&mut self, other: Self) {
        if !other.level.is_empty() {
            self.level = other.level;
        }
    }
}

// Default value functions

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

fn default_commit_timeout_ms() -> u64 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./controller_data")
}

fn default_standalone() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
