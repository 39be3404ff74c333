use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};

/// Main configuration for the beat extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Audio loading settings
    pub audio: AudioConfig,

    /// Beat tracking / ensemble settings
    pub tracking: TrackingConfig,

    /// Mini-beat grid settings
    pub grid: GridConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            tracking: TrackingConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|_| ConfigError::ParseFailed {
            path: path.display().to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.tracking.validate()?;
        self.grid.validate()?;
        Ok(())
    }
}

/// Audio loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sampling rate the decoded signal is resampled to (Hz)
    pub sampling_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 44100,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        if self.sampling_rate == 0 {
            return Err(ConfigError::InvalidValue {
                key: "audio.sampling_rate".to_string(),
                value: self.sampling_rate.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Beat tracking and ensemble configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Worker pool size for ensemble dispatch; 0 runs the three
    /// estimators sequentially in-process
    pub parallel_workers: usize,

    /// Thread budget inside each estimator's activation stage
    pub num_threads: usize,

    /// Minimum BPM for the first-pass downbeat estimator
    pub min_bpm: f64,

    /// Maximum BPM for the first-pass downbeat estimator
    pub max_bpm: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 3,
            num_threads: 3,
            min_bpm: 50.0,
            max_bpm: 230.0,
        }
    }
}

impl TrackingConfig {
    fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tracking.num_threads".to_string(),
                value: self.num_threads.to_string(),
            }
            .into());
        }

        if self.min_bpm <= 0.0 || self.min_bpm >= self.max_bpm {
            return Err(ConfigError::InvalidValue {
                key: "tracking.bpm_range".to_string(),
                value: format!("{}-{}", self.min_bpm, self.max_bpm),
            }
            .into());
        }

        Ok(())
    }
}

/// Mini-beat grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of mini-beats per 4/4 measure; normalized internally to a
    /// per-beat subdivision count of `round(mini_beat_div_n / 4)`
    pub mini_beat_div_n: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            mini_beat_div_n: 32,
        }
    }
}

impl GridConfig {
    fn validate(&self) -> Result<()> {
        // Anything below 2 rounds to zero subdivisions per beat
        if self.mini_beat_div_n < 2 {
            return Err(ConfigError::InvalidValue {
                key: "grid.mini_beat_div_n".to_string(),
                value: self.mini_beat_div_n.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
