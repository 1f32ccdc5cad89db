//! Session configuration
//!
//! Loaded from JSON. Every section and field is optional; missing values
//! fall back to the calibrated defaults. Durations use humantime syntax
//! ("200ms", "1s 350ms").

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use sapien_actuator::ActuatorConfig;
use sapien_gesture::{GestureThresholds, ThresholdError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid gesture thresholds: {0}")]
    InvalidThresholds(#[from] ThresholdError),

    #[error("Invalid angle range: min {min} > max {max}")]
    InvalidAngleRange { min: i32, max: i32 },

    #[error("Write spacing {0:?} is below the hardware minimum of 1s")]
    SpacingTooShort(Duration),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Elevation actuator settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ActuatorSettings {
    #[serde(deserialize_with = "humantime_duration")]
    pub debounce: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub min_write_spacing: Duration,
    pub min_angle: i32,
    pub max_angle: i32,
    /// Permit spacing below one second (simulated hardware only)
    pub allow_fast_writes: bool,
}

impl Default for ActuatorSettings {
    fn default() -> Self {
        let defaults = ActuatorConfig::default();
        ActuatorSettings {
            debounce: defaults.debounce,
            min_write_spacing: defaults.min_write_spacing,
            min_angle: defaults.min_angle,
            max_angle: defaults.max_angle,
            allow_fast_writes: false,
        }
    }
}

impl ActuatorSettings {
    pub fn to_actuator_config(&self) -> ActuatorConfig {
        ActuatorConfig {
            debounce: self.debounce,
            min_write_spacing: self.min_write_spacing,
            min_angle: self.min_angle,
            max_angle: self.max_angle,
            ..ActuatorConfig::default()
        }
    }
}

/// Logging settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete session configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub gestures: GestureThresholds,
    pub actuator: ActuatorSettings,
    pub log: LogConfig,
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gestures.validate()?;

        let actuator = &self.actuator;
        if actuator.min_angle > actuator.max_angle {
            return Err(ConfigError::InvalidAngleRange {
                min: actuator.min_angle,
                max: actuator.max_angle,
            });
        }
        if !actuator.allow_fast_writes && actuator.min_write_spacing < Duration::from_secs(1) {
            return Err(ConfigError::SpacingTooShort(actuator.min_write_spacing));
        }
        Ok(())
    }
}
