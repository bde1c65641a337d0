//! Configuration file handling.
//!
//! This module provides loading and saving of nextsweep configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/nextsweep/config.toml`
//! - macOS: `~/Library/Application Support/nextsweep/config.toml`
//! - Windows: `%APPDATA%\nextsweep\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! max_depth = 4
//! concurrency = 8
//! fetch = true
//! default_format = "table"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::discovery::DEFAULT_MAX_DEPTH;

/// Application configuration.
///
/// Loaded from a TOML file, or created with default values when the
/// file does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many directory levels below the scan root to search.
    ///
    /// Default: 4
    pub max_depth: usize,

    /// How many projects to probe concurrently.
    ///
    /// Default: 8
    pub concurrency: usize,

    /// Whether scans may run `git fetch` before counting commits behind
    /// remote branches. Disable for fully offline scans.
    ///
    /// Default: true
    pub fetch: bool,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: 8,
            fetch: true,
            default_format: "table".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nextsweep")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
