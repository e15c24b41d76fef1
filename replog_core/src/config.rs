//! Configuration file support for replog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/replog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,

    #[serde(default)]
    pub rest: RestConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Validation limits applied before a save reaches the store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    #[serde(default = "default_max_duration_seconds")]
    pub max_duration_seconds: u64,

    #[serde(default = "default_max_weight")]
    pub max_weight: f64,

    #[serde(default = "default_max_reps")]
    pub max_reps: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            max_duration_seconds: default_max_duration_seconds(),
            max_weight: default_max_weight(),
            max_reps: default_max_reps(),
        }
    }
}

/// Recoverability policy for store-side failures
///
/// Network errors are always retryable and validation errors always fixable
/// client-side; whether database and unclassified errors should offer a
/// retry is a judgment call, so it is configurable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_true")]
    pub database_recoverable: bool,

    #[serde(default = "default_true")]
    pub unknown_recoverable: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            database_recoverable: true,
            unknown_recoverable: true,
        }
    }
}

/// Rest timer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestConfig {
    /// Fallback target when a set carries no rest target of its own
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("replog")
}

fn default_max_name_len() -> usize {
    100
}

fn default_max_duration_seconds() -> u64 {
    86_400
}

fn default_max_weight() -> f64 {
    10_000.0
}

fn default_max_reps() -> u32 {
    1_000
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("replog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
