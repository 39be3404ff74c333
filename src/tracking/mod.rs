//! # Beat Tracking Module
//!
//! Multi-estimator consensus beat tracking. Three estimator configurations
//! (bar-constrained downbeat, probabilistic, simple) run over the same audio;
//! their trimmed-mean tempo estimates are averaged and the downbeat estimator
//! runs a second pass with the search band narrowed around the consensus.
//!
//! The estimators share a two-stage structure: a spectral-flux activation at
//! 100 fps followed by a decoding stage. The [`BeatTracker`] trait is the seam
//! for swapping the built-in backend for an external inference service.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beatgrid::tracking::{BeatTracker, EnsembleTracker, SpectralBeatTracker};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tracker = Arc::new(SpectralBeatTracker::new(3)) as Arc<dyn BeatTracker>;
//! let ensemble = EnsembleTracker::new(tracker, 3, 50.0, 230.0);
//! # let samples = vec![0.0f32; 44100];
//! let beats = ensemble.process(&samples, 44100)?;
//! println!("{} beats", beats.len());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod decoder;
pub mod ensemble;
pub mod estimator;

pub use activation::{Activation, ActivationGenerator, ANALYSIS_FPS};
pub use ensemble::{trimmed_mean_bpm, EnsembleTracker, ENSEMBLE_TIMEOUT, TEMPO_TOLERANCE};
pub use estimator::{BeatTracker, EstimatorRole, SpectralBeatTracker};
