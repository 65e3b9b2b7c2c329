//! Engine configuration loaded from TOML.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default number of batches kept on each of the undo and redo stacks.
pub const DEFAULT_HISTORY_DEPTH: usize = 20;

/// Errors while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    MissingFile(std::path::PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("history.depth must be at least 1")]
    ZeroDepth,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Undo/redo history section
    #[serde(default)]
    pub history: HistoryConfig,

    /// Document output section
    #[serde(default)]
    pub document: DocumentConfig,

    /// Save behavior section
    #[serde(default)]
    pub save: SaveConfig,
}

/// Undo/redo history settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HistoryConfig {
    /// Capacity of each stack; the oldest batch is dropped on overflow
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Discard pending redo batches when a new edit is recorded
    #[serde(default)]
    pub clear_redo_on_edit: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_HISTORY_DEPTH,
            clear_redo_on_edit: false,
        }
    }
}

/// Document output settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DocumentConfig {
    /// Write indented JSON
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Save settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SaveConfig {
    /// Run the validation pipeline before handing a snapshot to the store
    #[serde(default = "default_true")]
    pub validate: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self { validate: true }
    }
}

fn default_depth() -> usize {
    DEFAULT_HISTORY_DEPTH
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        if config.history.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
