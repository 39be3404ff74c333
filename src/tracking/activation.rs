use rayon::prelude::*;
use realfft::RealFftPlanner;

use crate::error::{Result, TrackingError};

/// Nominal analysis rate of the activation function, frames per second
pub const ANALYSIS_FPS: u32 = 100;

/// FFT window span in hops; the window size is the next power of two of
/// `hop * WINDOW_HOPS`, so onset smearing stays within a few frames at any
/// sampling rate
const WINDOW_HOPS: usize = 4;

/// Per-frame onset likelihood at (approximately) [`ANALYSIS_FPS`] frames per
/// second, normalized to [0, 1].
#[derive(Debug, Clone)]
pub struct Activation {
    /// Normalized onset strength per frame
    pub frames: Vec<f32>,

    /// Actual frame rate; equals [`ANALYSIS_FPS`] exactly when the sampling
    /// rate is an integer multiple of it
    pub fps: f64,
}

impl Activation {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Timestamp of a frame index in seconds
    pub fn time_of(&self, frame: usize) -> f64 {
        frame as f64 / self.fps
    }
}

/// Spectral-flux activation generator.
///
/// Produces the per-frame likelihood representation consumed by the decoders:
/// Hann-windowed FFT magnitudes, positive spectral flux between consecutive
/// frames, normalized to [0, 1]. Frame computation is split across a worker
/// pool of `num_threads` threads.
pub struct ActivationGenerator {
    num_threads: usize,
}

impl ActivationGenerator {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Compute the onset activation for a mono signal
    pub fn generate(&self, samples: &[f32], sample_rate: u32) -> Result<Activation> {
        if samples.is_empty() {
            return Err(TrackingError::ActivationFailed {
                reason: "empty audio signal".to_string(),
            }
            .into());
        }

        let hop = (sample_rate / ANALYSIS_FPS).max(1) as usize;
        let window_size = (hop * WINDOW_HOPS).next_power_of_two();
        let num_frames = samples.len() / hop;

        if num_frames == 0 {
            return Err(TrackingError::ActivationFailed {
                reason: format!(
                    "signal of {} samples is shorter than one analysis frame ({} samples)",
                    samples.len(),
                    hop
                ),
            }
            .into());
        }

        // Contiguous frame ranges, one per worker; each range recomputes the
        // frame preceding it so the flux difference stays seamless
        let chunk = num_frames.div_ceil(self.num_threads);
        let mut ranges = Vec::new();
        let mut start = 0;
        while start < num_frames {
            let end = (start + chunk).min(num_frames);
            ranges.push((start, end));
            start = end;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| TrackingError::ActivationFailed {
                reason: e.to_string(),
            })?;

        let flux_chunks: std::result::Result<Vec<Vec<f32>>, TrackingError> = pool.install(|| {
            ranges
                .par_iter()
                .map(|&(s, e)| flux_range(samples, hop, window_size, s, e))
                .collect()
        });

        let mut flux: Vec<f32> = Vec::with_capacity(num_frames);
        for chunk in flux_chunks? {
            flux.extend(chunk);
        }

        // Normalize to [0, 1]; a silent signal stays all-zero and the
        // decoders will report a degenerate result downstream
        let max_flux = flux.iter().fold(0.0f32, |acc, &x| acc.max(x));
        if max_flux > 0.0 {
            for value in &mut flux {
                *value /= max_flux;
            }
        }

        tracing::debug!(
            "Activation: {} frames at {:.1} fps (hop {}, window {})",
            flux.len(),
            sample_rate as f64 / hop as f64,
            hop,
            window_size
        );

        Ok(Activation {
            frames: flux,
            fps: sample_rate as f64 / hop as f64,
        })
    }
}

/// Compute positive spectral flux for frames `start..end`.
///
/// The frame before `start` is recomputed locally so each range only depends
/// on the raw samples. Frame 0 takes its flux against an all-zero spectrum.
fn flux_range(
    samples: &[f32],
    hop: usize,
    window_size: usize,
    start: usize,
    end: usize,
) -> std::result::Result<Vec<f32>, TrackingError> {
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window_size);
    let mut input_buffer = fft.make_input_vec();
    let mut spectrum_buffer = fft.make_output_vec();

    let first = start.saturating_sub(1);
    let mut previous_magnitude = vec![0.0f32; window_size / 2 + 1];
    let mut flux = Vec::with_capacity(end - start);

    for frame_idx in first..end {
        // Frames are centered on their hop position so onsets land on the
        // frame closest to them in time
        let frame_start = (frame_idx * hop) as isize - (window_size / 2) as isize;

        // Hann window, zero-padded outside the signal
        for i in 0..window_size {
            let idx = frame_start + i as isize;
            let sample = if idx >= 0 {
                samples.get(idx as usize).copied().unwrap_or(0.0)
            } else {
                0.0
            };
            let window_val = 0.5
                * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / (window_size - 1) as f32).cos());
            input_buffer[i] = sample * window_val;
        }

        fft.process(&mut input_buffer, &mut spectrum_buffer)
            .map_err(|_| TrackingError::ActivationFailed {
                reason: "FFT processing failed".to_string(),
            })?;

        let current_magnitude: Vec<f32> = spectrum_buffer.iter().map(|c| c.norm()).collect();

        if frame_idx >= start {
            let value: f32 = current_magnitude
                .iter()
                .zip(previous_magnitude.iter())
                .map(|(&curr, &prev)| (curr - prev).max(0.0))
                .sum();
            flux.push(value);
        }

        previous_magnitude = current_magnitude;
    }

    Ok(flux)
}
