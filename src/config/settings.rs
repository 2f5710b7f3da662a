//! Configuration settings for Callboard.

use crate::error::{ConfigError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduling: SchedulingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("callboard.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("callboard/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".callboard/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.scheduling.max_expansion_steps == 0 {
            return Err(
                ConfigError::Invalid("max_expansion_steps must be > 0".to_string()).into(),
            );
        }
        if self.scheduling.max_concurrent_fetches == 0 {
            return Err(
                ConfigError::Invalid("max_concurrent_fetches must be > 0".to_string()).into(),
            );
        }
        Ok(())
    }
}

/// Scheduling and conflict-detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Venue timezone used to interpret civil date + time-of-day pairs
    /// (agenda items, production events, all-day personal events).
    /// One explicit zone per deployment, never the server's local zone.
    pub venue_zone: Tz,
    /// Minimum commitment duration in minutes. 0 leaves zero-length
    /// records inert; a positive value widens them before overlap
    /// testing.
    pub min_event_duration_minutes: u32,
    /// Iteration cap for recurrence expansion.
    pub max_expansion_steps: usize,
    /// Maximum concurrent per-member fetches in the batch resolver.
    pub max_concurrent_fetches: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            venue_zone: Tz::UTC,
            min_event_duration_minutes: 0,
            max_expansion_steps: crate::schedule::recurrence::MAX_EXPANSION_STEPS,
            max_concurrent_fetches: 32,
        }
    }
}
