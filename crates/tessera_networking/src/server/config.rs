//! # Server Configuration
//!
//! TOML file, every field optional:
//!
//! ```toml
//! bind_addr = "0.0.0.0:7777"
//! tick_interval_ms = 16
//! settle_delay_ms = 1000
//! refresh_interval_ms = 16
//!
//! [world]
//! size_in_chunks = 8
//! flat = false
//! seed = 9103436896937115649
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tessera_core::DEFAULT_WORLD_SIZE_IN_CHUNKS;
use tessera_procedural::NoiseSeed;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// World generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Edge length in chunks.
    pub size_in_chunks: u8,
    /// Walkable dirt everywhere instead of terrain.
    pub flat: bool,
    /// Terrain seed.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size_in_chunks: DEFAULT_WORLD_SIZE_IN_CHUNKS,
            flat: false,
            seed: NoiseSeed::WORLD.value(),
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// TCP listen address.
    pub bind_addr: String,
    /// Target tick interval.
    pub tick_interval_ms: u64,
    /// Delay before the first tick.
    pub settle_delay_ms: u64,
    /// Per-connection viewport refresh interval.
    pub refresh_interval_ms: u64,
    /// World generation.
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7777".to_owned(),
            tick_interval_ms: 16,
            settle_delay_ms: 1000,
            refresh_interval_ms: 16,
            world: WorldConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// I/O, parse or validation failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("refresh_interval_ms must be positive".into()));
        }
        if self.world.size_in_chunks == 0 {
            return Err(ConfigError::Invalid("world.size_in_chunks must be positive".into()));
        }
        Ok(())
    }

    /// Tick interval.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Settle delay.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Refresh interval.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
