//! Application configuration.

use crate::error::{AppError, AppResult};
use odm_detector::DetectorConfig;
use odm_sim::SimulationParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file used when neither `--config` nor `ODM_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ODM_CONFIG";

/// Where ticks and quotes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Replay a generated price path.
    #[default]
    Simulator,
    /// JSON lines (`{"channel": ..., "data": ...}`) on standard input.
    Stdin,
}

/// Input source selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
}

/// Tick buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Maximum retained points. Default: 1000.
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,
}

fn default_buffer_capacity() -> usize {
    odm_feed::DEFAULT_CAPACITY
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_buffer_capacity(),
        }
    }
}

/// Simulator replay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(flatten)]
    pub params: SimulationParams,
    /// Milliseconds between replayed ticks. Default: 1000.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: i64,
}

fn default_tick_interval_ms() -> i64 {
    1_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: SimulationParams::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Event channel capacity. Default: 1024.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            detector: DetectorConfig::default(),
            buffer: BufferConfig::default(),
            simulation: SimulationConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path priority: `explicit` > `ODM_CONFIG` > `config/default.toml`.
    /// An explicit or env path must exist; a missing default file falls back
    /// to built-in defaults.
    pub fn load(explicit: Option<String>) -> AppResult<Self> {
        let chosen = explicit.or_else(|| std::env::var(CONFIG_ENV_VAR).ok());

        let config = match chosen {
            Some(path) => {
                tracing::info!(path = %path, "Loading configuration");
                Self::from_file(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                tracing::info!(path = DEFAULT_CONFIG_PATH, "Loading configuration");
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                tracing::warn!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
                Self::default()
            }
        };

        config.validate().map_err(AppError::Config)?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse from a TOML document.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.detector.validate()?;

        if self.channel_capacity == 0 {
            return Err("channel_capacity must be at least 1".to_string());
        }

        if self.buffer.capacity == 0 {
            return Err("buffer.capacity must be at least 1".to_string());
        }

        if self.simulation.tick_interval_ms <= 0 {
            return Err(format!(
                "simulation.tick_interval_ms ({}) must be positive",
                self.simulation.tick_interval_ms
            ));
        }

        let params = &self.simulation.params;
        if !params.base_price.is_finite() || params.base_price <= 0.0 {
            return Err(format!(
                "simulation.base_price ({}) must be a positive number",
                params.base_price
            ));
        }

        for (name, value) in [
            ("volatility", params.volatility),
            ("oracle_noise", params.oracle_noise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "simulation.{name} ({value}) must be a non-negative number"
                ));
            }
        }

        if !params.drift.is_finite() {
            return Err(format!("simulation.drift ({}) must be finite", params.drift));
        }

        Ok(())
    }
}
