//! Configuration for bestiary
//!
//! Loaded from `config.toml` (default `~/.config/bestiary/config.toml`).
//! Every field has a default, so an empty or missing file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestiaryConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub etl: EtlConfig,
}

/// Relational store location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bestiary")
            .join("bestiary.db");
        Self { path }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false every read goes to the store
    pub enabled: bool,

    /// Capacity cap; beyond it entries are evicted (TinyLFU + LRU)
    pub max_entries: u64,

    /// TTL for paginated listings
    pub list_ttl_secs: u64,

    /// TTL for category and trait listings
    pub reference_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
            list_ttl_secs: 300,
            reference_ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    pub fn reference_ttl(&self) -> Duration {
        Duration::from_secs(self.reference_ttl_secs)
    }
}

/// External ETL service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://etl:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EtlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BestiaryConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("bestiary").join("config.toml"))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse bestiary configuration")
    }

    /// Load from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Load from `path` if given, otherwise from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::load_from(&default),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}
