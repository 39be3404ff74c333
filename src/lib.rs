//! # beatgrid
//!
//! Beat and mini-beat extraction from audio recordings, producing the rhythmic
//! grid used by downstream music transcription.
//!
//! Three beat estimators (bar-constrained downbeat, probabilistic, simple) run
//! over the same recording, a trimmed-mean tempo consensus reconciles their
//! disagreements, and a second refinement pass decodes the final beat track
//! inside a narrowed tempo band. Beats are then subdivided into mini-beats by
//! extrapolating linear interpolation, clipped to the audio duration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beatgrid::{pipeline, Config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//!
//! let (beats, audio_len_sec) = pipeline::extract_beat("song.wav", &config)?;
//! let mini_beats = pipeline::extract_mini_beat_from_beats(&beats, audio_len_sec, 32)?;
//!
//! println!("{} beats, {} mini-beats", beats.len(), mini_beats.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - Audio decoding, mono downmix, resampling
//! - [`tracking`] - Activation generation, decoders, ensemble consensus
//! - [`grid`] - Beat to mini-beat interpolation
//! - [`pipeline`] - End-to-end entry points
//! - [`config`] - Configuration management
//!
//! ## Swapping the inference backend
//!
//! The built-in spectral-flux tracker can be replaced by implementing the
//! [`BeatTracker`](tracking::BeatTracker) trait:
//!
//! ```rust,no_run
//! use beatgrid::error::Result;
//! use beatgrid::tracking::BeatTracker;
//!
//! struct MyBackend;
//!
//! impl BeatTracker for MyBackend {
//!     fn track_downbeats(
//!         &self,
//!         samples: &[f32],
//!         sample_rate: u32,
//!         min_bpm: f64,
//!         max_bpm: f64,
//!     ) -> Result<Vec<f64>> {
//!         // Call out to your inference service
//!         todo!()
//!     }
//!
//!     fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
//!         todo!()
//!     }
//!
//!     fn track_beats_simple(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
//!         todo!()
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "my-backend"
//!     }
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod grid;
pub mod pipeline;
pub mod tracking;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{BeatgridError, Result},
    pipeline::{extract_beat, extract_mini_beat_from_audio, extract_mini_beat_from_beats},
    tracking::{BeatTracker, EnsembleTracker, SpectralBeatTracker},
};
