// src/config.rs
//
// Pool configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bus::BusRouting;
use crate::error::ConfigError;

pub const DEFAULT_CAPACITY: usize = 8;

/// Options recognized when building a `VoicePool`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Voices the pool retains outside the background voice.
    pub capacity: usize,

    /// Create voices past `capacity` when no idle voice is left.
    pub auto_grow: bool,

    /// Pool-wide gain applied to every play request.
    pub initial_volume: f32,

    /// Create `capacity` idle voices up front.
    pub prewarm: bool,

    /// Mixer target for each bus.
    pub buses: BusRouting,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            auto_grow: true,
            initial_volume: 1.0,
            prewarm: false,
            buses: BusRouting::default(),
        }
    }
}

impl PoolConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_auto_grow(mut self, auto_grow: bool) -> Self {
        self.auto_grow = auto_grow;
        self
    }

    pub fn with_initial_volume(mut self, volume: f32) -> Self {
        self.initial_volume = volume;
        self
    }

    pub fn with_prewarm(mut self, prewarm: bool) -> Self {
        self.prewarm = prewarm;
        self
    }

    pub fn with_buses(mut self, buses: BusRouting) -> Self {
        self.buses = buses;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loading voice pool configuration from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 && !self.auto_grow {
            return Err(ConfigError::Invalid(
                "capacity 0 without auto_grow can never play a sound".into(),
            ));
        }

        if !self.initial_volume.is_finite() || self.initial_volume < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_volume must be a finite, non-negative number (got {})",
                self.initial_volume
            )));
        }

        Ok(())
    }
}
