//! Configuration file support for Cadence.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/cadence/config.toml`, or
//! from the path in `CADENCE_CONFIG` when that variable is set.

use crate::scheduler::{DEFAULT_EASE_FACTOR, MAX_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV_VAR: &str = "CADENCE_CONFIG";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub cards: CardsConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub review: ReviewConfig,
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

/// Defaults for newly added cards
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_initial_ease_factor")]
    pub initial_ease_factor: f64,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            initial_ease_factor: default_initial_ease_factor(),
        }
    }
}

/// Limits for queue listings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_due_limit")]
    pub due_limit: usize,

    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            due_limit: default_due_limit(),
            list_limit: default_list_limit(),
        }
    }
}

/// Review submission settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Reviewer id written to the review log
    #[serde(default = "default_reviewer")]
    pub reviewer: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            reviewer: default_reviewer(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("cadence")
}

fn default_initial_ease_factor() -> f64 {
    DEFAULT_EASE_FACTOR
}

fn default_due_limit() -> usize {
    500
}

fn default_list_limit() -> usize {
    100
}

fn default_reviewer() -> String {
    "local".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("cadence").join("config.toml")
    }

    /// Reject values that would make the tool misbehave
    pub fn validate(&self) -> Result<()> {
        let ease = self.cards.initial_ease_factor;
        if !ease.is_finite() || !(MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&ease) {
            return Err(Error::Config(format!(
                "cards.initial_ease_factor must be between {} and {}, got {}",
                MIN_EASE_FACTOR, MAX_EASE_FACTOR, ease
            )));
        }

        if self.queue.due_limit == 0 || self.queue.list_limit == 0 {
            return Err(Error::Config("queue limits must be at least 1".into()));
        }

        if self.review.reviewer.trim().is_empty() {
            return Err(Error::Config("review.reviewer must not be empty".into()));
        }

        Ok(())
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
