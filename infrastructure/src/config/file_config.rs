//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Document store settings
    pub store: FileStoreConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// JSON snapshot holding every collection
    pub path: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("waverun.json"),
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    #[default]
    Text,
    Json,
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Root segment of every tool output directory (usually the assessment name)
    pub namespace: String,
    /// Console output format
    pub format: FileOutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            format: FileOutputFormat::Text,
            color: true,
        }
    }
}

/// Configuration rejected after merging.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("output.namespace must not be empty")]
    EmptyNamespace,

    #[error("store.path must not be empty")]
    EmptyStorePath,
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.output.namespace.trim().is_empty() {
            return Err(ConfigValidationError::EmptyNamespace);
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyStorePath);
        }
        Ok(())
    }
}
