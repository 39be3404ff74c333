use thiserror::Error;

use crate::tracking::EstimatorRole;

/// Main error type for the beatgrid library
#[derive(Error, Debug)]
pub enum BeatgridError {
    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Beat tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Ensemble error: {0}")]
    Ensemble(#[from] EnsembleError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Audio loading/decoding errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio signal is empty: {path}")]
    EmptySignal { path: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Estimator-level errors
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Estimator {role} produced a degenerate result: {count} beat(s), need at least 2")]
    DegenerateResult { role: EstimatorRole, count: usize },

    #[error("Beat array too short for interpolation: {count} beat(s), need at least 2")]
    TooFewBeats { count: usize },

    #[error("Beat times are not strictly increasing: {details}")]
    NonIncreasingBeats { details: String },

    #[error("Activation generation failed: {reason}")]
    ActivationFailed { reason: String },

    #[error("Invalid tempo range: {min_bpm}-{max_bpm} BPM")]
    InvalidTempoRange { min_bpm: f64, max_bpm: f64 },
}

/// Ensemble dispatch errors
#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("Ensemble dispatch exceeded the {seconds}s deadline")]
    Timeout { seconds: u64 },

    #[error("Ensemble worker for {role} failed before delivering a result")]
    WorkerFailed { role: EstimatorRole },

    #[error("Failed to build worker pool: {reason}")]
    PoolBuild { reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using BeatgridError
pub type Result<T> = std::result::Result<T, BeatgridError>;

impl BeatgridError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Audio loading might work on retry
            Self::Audio(AudioError::LoadFailed { .. }) => true,
            // Tracking/ensemble failures are deterministic for a given input
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!(
                    "Could not load audio file '{}'. Please check the file exists and is a supported format.",
                    path
                )
            }
            Self::Tracking(TrackingError::DegenerateResult { role, count }) => {
                format!(
                    "The {} estimator found only {} beat(s). The recording may be too short or rhythmically flat.",
                    role, count
                )
            }
            Self::Ensemble(EnsembleError::Timeout { seconds }) => {
                format!("Beat tracking did not finish within {} seconds.", seconds)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
