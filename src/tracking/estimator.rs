use std::fmt;

use crate::error::{Result, TrackingError};
use crate::tracking::activation::ActivationGenerator;
use crate::tracking::decoder::{BarAwareDecoder, PeakPickingDecoder, TempoGridDecoder};

/// Default tempo search band of the unconstrained estimators
pub const DEFAULT_MIN_BPM: f64 = 55.0;
pub const DEFAULT_MAX_BPM: f64 = 215.0;

/// Semantic role of an estimator inside the ensemble.
///
/// Results are reassembled by role, not by completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimatorRole {
    /// Bar-constrained downbeat tracking
    ConstrainedDownbeat,
    /// Probabilistic beat tracking, no bar constraint
    ProbabilisticBeat,
    /// Simple non-probabilistic beat tracking
    SimpleBeat,
}

impl fmt::Display for EstimatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConstrainedDownbeat => "downbeat",
            Self::ProbabilisticBeat => "beat",
            Self::SimpleBeat => "simple-beat",
        };
        write!(f, "{}", name)
    }
}

/// Beat tracking backend: the call contract for the inference collaborator.
///
/// Each method chains an activation-generation stage with a decoding stage and
/// returns an ordered beat-time array in seconds. Implementations must be
/// deterministic for a given input so sequential and parallel ensemble
/// dispatch produce identical results.
pub trait BeatTracker: Send + Sync {
    /// Downbeat tracking constrained to bar lengths of 3-7 beats and the
    /// given BPM search band. Only the beat-time channel is returned; the
    /// bar-position channel is discarded.
    fn track_downbeats(
        &self,
        samples: &[f32],
        sample_rate: u32,
        min_bpm: f64,
        max_bpm: f64,
    ) -> Result<Vec<f64>>;

    /// Probabilistic beat tracking without bar constraint
    fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>>;

    /// Simple non-probabilistic beat tracking
    fn track_beats_simple(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>>;

    /// Backend name (for logging)
    fn name(&self) -> &'static str;
}

/// Built-in spectral-flux beat tracker.
///
/// Stands in for the external neural inference service: onset activation at
/// 100 fps followed by one of the three decoders. `num_threads` is the thread
/// budget of the activation stage.
pub struct SpectralBeatTracker {
    num_threads: usize,
}

impl SpectralBeatTracker {
    pub fn new(num_threads: usize) -> Self {
        Self { num_threads }
    }

    /// Reject estimator outputs too short for interval statistics
    fn ensure_enough(role: EstimatorRole, beats: Vec<f64>) -> Result<Vec<f64>> {
        if beats.len() < 2 {
            return Err(TrackingError::DegenerateResult {
                role,
                count: beats.len(),
            }
            .into());
        }
        Ok(beats)
    }
}

impl BeatTracker for SpectralBeatTracker {
    fn track_downbeats(
        &self,
        samples: &[f32],
        sample_rate: u32,
        min_bpm: f64,
        max_bpm: f64,
    ) -> Result<Vec<f64>> {
        let activation = ActivationGenerator::new(self.num_threads).generate(samples, sample_rate)?;
        let rows = BarAwareDecoder::new(min_bpm, max_bpm).decode(&activation)?;
        let beats = rows.into_iter().map(|(time, _)| time).collect();
        Self::ensure_enough(EstimatorRole::ConstrainedDownbeat, beats)
    }

    fn track_beats(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
        let activation = ActivationGenerator::new(self.num_threads).generate(samples, sample_rate)?;
        let beats = TempoGridDecoder::new(DEFAULT_MIN_BPM, DEFAULT_MAX_BPM).decode(&activation)?;
        Self::ensure_enough(EstimatorRole::ProbabilisticBeat, beats)
    }

    fn track_beats_simple(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
        let activation = ActivationGenerator::new(self.num_threads).generate(samples, sample_rate)?;
        let beats = PeakPickingDecoder::new(DEFAULT_MAX_BPM).decode(&activation)?;
        Self::ensure_enough(EstimatorRole::SimpleBeat, beats)
    }

    fn name(&self) -> &'static str {
        "spectral-flux"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeatgridError;

    /// Click track at `period_sec` spacing
    fn click_signal(sample_rate: u32, duration_sec: f64, period_sec: f64) -> Vec<f32> {
        let len = (sample_rate as f64 * duration_sec) as usize;
        let mut samples = vec![0.0f32; len];
        let period = (sample_rate as f64 * period_sec) as usize;
        let burst = sample_rate as usize / 100;

        let mut pos = period;
        while pos + burst < len {
            for i in 0..burst {
                samples[pos + i] = if i % 2 == 0 { 0.9 } else { -0.9 };
            }
            pos += period;
        }
        samples
    }

    #[test]
    fn test_tracker_finds_click_grid() {
        let samples = click_signal(10000, 8.0, 0.5);
        let tracker = SpectralBeatTracker::new(2);

        let beats = tracker.track_beats(&samples, 10000).unwrap();
        assert!(beats.len() >= 10);
        for pair in beats.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 0.05);
        }
    }

    #[test]
    fn test_downbeat_channel_is_times_only() {
        let samples = click_signal(10000, 8.0, 0.5);
        let tracker = SpectralBeatTracker::new(2);

        let beats = tracker
            .track_downbeats(&samples, 10000, 50.0, 230.0)
            .unwrap();
        assert!(beats.len() >= 10);
        for pair in beats.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_silence_is_degenerate() {
        let samples = vec![0.0f32; 80_000];
        let tracker = SpectralBeatTracker::new(1);

        let result = tracker.track_beats(&samples, 10000);
        match result {
            Err(BeatgridError::Tracking(TrackingError::DegenerateResult { role, count })) => {
                assert_eq!(role, EstimatorRole::ProbabilisticBeat);
                assert!(count < 2);
            }
            other => panic!("Expected DegenerateResult, got {:?}", other.map(|b| b.len())),
        }
    }
}
