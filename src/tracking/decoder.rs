use crate::error::{Result, TrackingError};
use crate::tracking::activation::Activation;

/// Bar lengths (beats per bar) the downbeat decoder may choose from
pub const BAR_LENGTHS: [usize; 5] = [3, 4, 5, 6, 7];

/// Peak-picking sensitivity shared by the decoders (0.0-1.0)
const PEAK_SENSITIVITY: f32 = 0.7;

/// Tempo-grid decoder: the probabilistic decoding stage.
///
/// Picks the dominant beat period by autocorrelation of the activation within
/// the BPM search band, selects the grid phase with the highest summed
/// activation, then snaps each grid point to the nearest local activation
/// maximum.
pub struct TempoGridDecoder {
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl TempoGridDecoder {
    pub fn new(min_bpm: f64, max_bpm: f64) -> Self {
        Self { min_bpm, max_bpm }
    }

    /// Decode beat times (seconds) from an activation
    pub fn decode(&self, activation: &Activation) -> Result<Vec<f64>> {
        let frames = beat_grid(activation, self.min_bpm, self.max_bpm)?;
        Ok(frames
            .into_iter()
            .map(|f| activation.time_of(f))
            .collect())
    }
}

/// Bar-aware decoder: the downbeat decoding stage.
///
/// Same tempo grid as [`TempoGridDecoder`], then scores every bar length in
/// [`BAR_LENGTHS`] and every downbeat rotation against the activation and
/// annotates each beat with its 1-based position in the bar.
pub struct BarAwareDecoder {
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl BarAwareDecoder {
    pub fn new(min_bpm: f64, max_bpm: f64) -> Self {
        Self { min_bpm, max_bpm }
    }

    /// Decode `(beat time, position in bar)` rows from an activation
    pub fn decode(&self, activation: &Activation) -> Result<Vec<(f64, usize)>> {
        let frames = beat_grid(activation, self.min_bpm, self.max_bpm)?;
        if frames.is_empty() {
            return Ok(Vec::new());
        }

        // Downbeats carry more energy on average; pick the (bar length,
        // rotation) pair whose downbeat slots line up with the strongest beats
        let mut best = (BAR_LENGTHS[0], 0, f32::MIN);
        for &bar_len in &BAR_LENGTHS {
            for rotation in 0..bar_len {
                let mut sum = 0.0f32;
                let mut count = 0usize;
                for (i, &frame) in frames.iter().enumerate() {
                    if i % bar_len == rotation {
                        sum += activation.frames[frame];
                        count += 1;
                    }
                }
                if count == 0 {
                    continue;
                }
                let score = sum / count as f32;
                if score > best.2 {
                    best = (bar_len, rotation, score);
                }
            }
        }

        let (bar_len, rotation, _) = best;
        tracing::debug!("Bar fit: {} beats per bar, downbeat offset {}", bar_len, rotation);

        Ok(frames
            .iter()
            .enumerate()
            .map(|(i, &frame)| {
                let position = (i + bar_len - rotation) % bar_len + 1;
                (activation.time_of(frame), position)
            })
            .collect())
    }
}

/// Simple decoder: non-probabilistic peak picking.
///
/// Local maxima above an adaptive threshold, with a minimum separation derived
/// from `max_bpm`. No tempo model.
pub struct PeakPickingDecoder {
    pub max_bpm: f64,
}

impl PeakPickingDecoder {
    pub fn new(max_bpm: f64) -> Self {
        Self { max_bpm }
    }

    /// Decode beat times (seconds) from an activation
    pub fn decode(&self, activation: &Activation) -> Result<Vec<f64>> {
        if self.max_bpm <= 0.0 {
            return Err(TrackingError::InvalidTempoRange {
                min_bpm: 0.0,
                max_bpm: self.max_bpm,
            }
            .into());
        }

        let act = &activation.frames;
        let min_separation = (activation.fps * 60.0 / self.max_bpm).round() as usize;

        let mut beats = Vec::new();
        let mut last_beat: Option<usize> = None;

        for i in 3..act.len().saturating_sub(3) {
            let window = &act[i - 3..i + 4];
            let local_max = window.iter().fold(0.0f32, |acc, &x| acc.max(x));
            let local_mean = window.iter().sum::<f32>() / window.len() as f32;
            let threshold = local_mean + PEAK_SENSITIVITY * (local_max - local_mean) * 0.5;

            if act[i] >= threshold && act[i] == local_max && act[i] > local_mean * 1.5 {
                let far_enough = last_beat.map_or(true, |last| i - last >= min_separation);
                if far_enough {
                    beats.push(activation.time_of(i));
                    last_beat = Some(i);
                }
            }
        }

        Ok(beats)
    }
}

/// Shared tempo-grid construction: autocorrelation period pick, best-phase
/// selection, local-max snapping. Returns frame indices, strictly increasing.
fn beat_grid(activation: &Activation, min_bpm: f64, max_bpm: f64) -> Result<Vec<usize>> {
    if min_bpm <= 0.0 || min_bpm >= max_bpm {
        return Err(TrackingError::InvalidTempoRange { min_bpm, max_bpm }.into());
    }

    let act = &activation.frames;
    let min_lag = ((activation.fps * 60.0 / max_bpm).round() as usize).max(1);
    let max_lag = (activation.fps * 60.0 / min_bpm).round() as usize;

    // Too little signal to measure a period in this band
    if act.len() <= min_lag + 1 {
        return Ok(Vec::new());
    }
    let max_lag = max_lag.min(act.len() - 1);
    if min_lag >= max_lag {
        return Ok(Vec::new());
    }

    let lag = match best_lag(act, min_lag, max_lag) {
        Some(lag) => lag,
        None => return Ok(Vec::new()),
    };

    // Phase with the highest mean activation over its grid points
    let mut best_phase = 0;
    let mut best_score = f32::MIN;
    for phase in 0..lag {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        let mut frame = phase;
        while frame < act.len() {
            sum += act[frame];
            count += 1;
            frame += lag;
        }
        if count > 0 {
            let score = sum / count as f32;
            if score > best_score {
                best_score = score;
                best_phase = phase;
            }
        }
    }

    // Emit the grid, snapping each point to the local activation maximum;
    // the snap radius stays below lag/2 so ordering is preserved
    let radius = lag / 8;
    let mut frames = Vec::new();
    let mut frame = best_phase;
    while frame < act.len() {
        let snapped = snap_to_local_max(act, frame, radius);
        if frames.last().map_or(true, |&last| snapped > last) {
            frames.push(snapped);
        }
        frame += lag;
    }

    tracing::debug!(
        "Tempo grid: lag {} frames ({:.1} BPM), phase {}, {} beats",
        lag,
        activation.fps * 60.0 / lag as f64,
        best_phase,
        frames.len()
    );

    Ok(frames)
}

/// Autocorrelation peak within a lag band
fn best_lag(act: &[f32], min_lag: usize, max_lag: usize) -> Option<usize> {
    let mut best = None;
    let mut best_value = 0.0f32;

    for lag in min_lag..=max_lag {
        let mut sum = 0.0f32;
        for i in 0..act.len() - lag {
            sum += act[i] * act[i + lag];
        }
        let value = sum / (act.len() - lag) as f32;
        if value > best_value {
            best_value = value;
            best = Some(lag);
        }
    }

    // A flat activation has no usable peak
    if best_value <= 0.0 {
        return None;
    }
    best
}

/// Index of the maximum activation within `center ± radius`, earliest on ties
fn snap_to_local_max(act: &[f32], center: usize, radius: usize) -> usize {
    let start = center.saturating_sub(radius);
    let end = (center + radius + 1).min(act.len());

    let mut best_idx = center.min(act.len() - 1);
    let mut best_value = act[best_idx];
    for (i, &value) in act.iter().enumerate().take(end).skip(start) {
        if value > best_value {
            best_value = value;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Activation with unit spikes every `period` frames starting at `phase`
    fn spiky_activation(len: usize, period: usize, phase: usize) -> Activation {
        let mut frames = vec![0.0f32; len];
        let mut i = phase;
        while i < len {
            frames[i] = 1.0;
            i += period;
        }
        Activation { frames, fps: 100.0 }
    }

    #[test]
    fn test_tempo_grid_recovers_period_and_phase() {
        let activation = spiky_activation(1000, 50, 10);
        let decoder = TempoGridDecoder::new(75.0, 150.0);
        let beats = decoder.decode(&activation).unwrap();

        assert!(beats.len() >= 15);
        // First beat at frame 10 -> 0.1 s, then every 0.5 s
        assert!((beats[0] - 0.10).abs() < 1e-9);
        for pair in beats.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 0.02);
        }
    }

    #[test]
    fn test_tempo_grid_is_strictly_increasing() {
        let activation = spiky_activation(800, 40, 3);
        let beats = TempoGridDecoder::new(100.0, 200.0)
            .decode(&activation)
            .unwrap();
        for pair in beats.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_invalid_band_is_rejected() {
        let activation = spiky_activation(500, 50, 0);
        let result = TempoGridDecoder::new(200.0, 100.0).decode(&activation);
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_activation_yields_no_beats() {
        let activation = Activation {
            frames: vec![0.0; 600],
            fps: 100.0,
        };
        let beats = TempoGridDecoder::new(75.0, 150.0)
            .decode(&activation)
            .unwrap();
        assert!(beats.is_empty());
    }

    #[test]
    fn test_bar_decoder_finds_four_beat_bar() {
        // Every 4th spike is stronger: a 4/4 pattern with downbeat at index 2
        let mut activation = spiky_activation(1200, 50, 10);
        let mut i = 10;
        let mut beat_idx = 0;
        while i < activation.frames.len() {
            activation.frames[i] = if beat_idx % 4 == 2 { 1.0 } else { 0.6 };
            i += 50;
            beat_idx += 1;
        }

        let rows = BarAwareDecoder::new(75.0, 150.0)
            .decode(&activation)
            .unwrap();
        assert!(rows.len() >= 15);

        // The beat-time channel must match the plain tempo grid
        let beats = TempoGridDecoder::new(75.0, 150.0)
            .decode(&activation)
            .unwrap();
        let times: Vec<f64> = rows.iter().map(|r| r.0).collect();
        assert_eq!(times, beats);

        // Downbeat positions land on the strong beats
        for (i, &(_, position)) in rows.iter().enumerate() {
            if i % 4 == 2 {
                assert_eq!(position, 1);
            }
        }
    }

    #[test]
    fn test_peak_picking_finds_spikes() {
        let activation = spiky_activation(1000, 50, 10);
        let beats = PeakPickingDecoder::new(215.0).decode(&activation).unwrap();

        assert!(beats.len() >= 15);
        for pair in beats.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 0.02);
        }
    }

    #[test]
    fn test_peak_picking_respects_min_separation() {
        // Spikes every 10 frames would be 600 BPM; with max_bpm 215 the
        // decoder must keep beats at least ~28 frames apart
        let activation = spiky_activation(1000, 10, 5);
        let beats = PeakPickingDecoder::new(215.0).decode(&activation).unwrap();
        for pair in beats.windows(2) {
            assert!(pair[1] - pair[0] >= 60.0 / 215.0 - 1e-9);
        }
    }
}
