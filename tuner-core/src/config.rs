//! # Tuner Configuration
//!
//! Every tunable of the pipeline lives in [`TunerConfig`]: tuning mode, noise
//! gate, lag search range, accepted pitch range, frame size and needle clamp.
//! Configurations are stored as JSON; missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::tuning::TuningMode;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Energy threshold must be positive, got {0}")]
    EnergyThreshold(f32),

    #[error("Lag search range must satisfy 0 < min < max, got {min}..{max}")]
    LagRange { min: usize, max: usize },

    #[error("Accepted frequency range must satisfy 0 <= min < max, got {min}..{max}")]
    FrequencyRange { min: f32, max: f32 },

    #[error("Frame size must be a power of two of at least 2, got {0}")]
    FrameSize(usize),

    #[error("Needle range must be positive, got {0}")]
    NeedleRange(f32),
}

fn default_energy_threshold() -> f32 {
    0.01
}

fn default_lag_search_range() -> (usize, usize) {
    (20, 1024)
}

fn default_accepted_frequency_range() -> (f32, f32) {
    (30.0, 4000.0)
}

fn default_frame_size() -> usize {
    4096
}

fn default_needle_range_hz() -> f32 {
    50.0
}

fn default_subharmonic_suppression() -> bool {
    true
}

/// Complete tuner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Reference note set to match against
    #[serde(default)]
    pub tuning_mode: TuningMode,
    /// Minimum frame RMS for a pitch estimate
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f32,
    /// Autocorrelation lags searched, `[min, max)` in samples
    #[serde(default = "default_lag_search_range")]
    pub lag_search_range: (usize, usize),
    /// Estimates outside this open interval (Hz) are discarded
    #[serde(default = "default_accepted_frequency_range")]
    pub accepted_frequency_range: (f32, f32),
    /// Samples per analysis frame
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    /// Needle offsets are clamped to ±this many Hz
    #[serde(default = "default_needle_range_hz")]
    pub needle_range_hz: f32,
    /// Prefer the first strong correlation peak over sub-harmonics
    #[serde(default = "default_subharmonic_suppression")]
    pub subharmonic_suppression: bool,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            tuning_mode: TuningMode::default(),
            energy_threshold: default_energy_threshold(),
            lag_search_range: default_lag_search_range(),
            accepted_frequency_range: default_accepted_frequency_range(),
            frame_size: default_frame_size(),
            needle_range_hz: default_needle_range_hz(),
            subharmonic_suppression: default_subharmonic_suppression(),
        }
    }
}

impl TunerConfig {
    /// Checks every field, returning the first violation found.
    ///
    /// A lag range reaching past the frame size is allowed (the estimator
    /// clamps it) but logged as a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Negated comparisons also reject NaN.
        if !(self.energy_threshold > 0.0) {
            return Err(ConfigError::EnergyThreshold(self.energy_threshold));
        }

        let (min_lag, max_lag) = self.lag_search_range;
        if min_lag == 0 || min_lag >= max_lag {
            return Err(ConfigError::LagRange {
                min: min_lag,
                max: max_lag,
            });
        }

        let (min_freq, max_freq) = self.accepted_frequency_range;
        if !(min_freq >= 0.0 && min_freq < max_freq) {
            return Err(ConfigError::FrequencyRange {
                min: min_freq,
                max: max_freq,
            });
        }

        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(ConfigError::FrameSize(self.frame_size));
        }

        if !(self.needle_range_hz > 0.0) {
            return Err(ConfigError::NeedleRange(self.needle_range_hz));
        }

        if max_lag > self.frame_size {
            tracing::warn!(
                max_lag,
                frame_size = self.frame_size,
                "Lag search range exceeds frame size, it will be clamped"
            );
        }
        Ok(())
    }

    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`TunerConfig::load`], falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config from disk");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }
}
