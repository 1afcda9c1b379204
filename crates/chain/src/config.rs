//! Ledger configuration stored alongside the data directory.

use chaintrack_consensus::PowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while reading or writing `config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Proof-of-work parameters used for both mining and validation.
    pub pow: PowConfig,
    /// Report blocks whose previous hash does not match their predecessor.
    pub strict_linkage: bool,
}

impl LedgerConfig {
    /// File name inside the data directory.
    pub const FILE_NAME: &'static str = "config.json";

    /// Configuration with the given difficulty and defaults elsewhere.
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            pow: PowConfig::new(difficulty),
            strict_linkage: false,
        }
    }

    /// Path of the config file for `data_dir`.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::FILE_NAME)
    }

    /// Load the config file from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(Self::path(data_dir))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load_or_default(data_dir: &Path) -> Result<Self, ConfigError> {
        match Self::load(data_dir) {
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the config file into `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(data_dir)?;
        fs::write(Self::path(data_dir), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
