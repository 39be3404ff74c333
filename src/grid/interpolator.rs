use crate::error::{ConfigError, Result, TrackingError};

/// Subdivide a beat-time array into a mini-beat grid.
///
/// `mini_beat_div_n` is the number of mini-beats in a 4/4 measure; it is
/// normalized to `round(mini_beat_div_n / 4)` subdivisions per beat. Beats are
/// indexed 1..=N on an integer grid; the index-to-time mapping is linear
/// between known beats and linearly extrapolated beyond them. The grid is
/// sampled at fractional indices `k / divisions` for `k` in
/// `0..(N + 1) * divisions`, and samples outside `[0, audio_len_sec]` are
/// discarded.
///
/// The output is monotonically non-decreasing and bounded by the audio
/// duration. Pure function: identical inputs yield identical output.
pub fn subdivide(beats: &[f64], audio_len_sec: f64, mini_beat_div_n: u32) -> Result<Vec<f64>> {
    let divisions = (mini_beat_div_n as f64 / 4.0).round() as usize;
    if divisions == 0 {
        return Err(ConfigError::InvalidValue {
            key: "mini_beat_div_n".to_string(),
            value: mini_beat_div_n.to_string(),
        }
        .into());
    }

    if beats.len() < 2 {
        return Err(TrackingError::TooFewBeats { count: beats.len() }.into());
    }
    if beats.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(TrackingError::NonIncreasingBeats {
            details: "interpolation input".to_string(),
        }
        .into());
    }

    let n = beats.len();
    let total = (n + 1) * divisions;
    let mut mini_beats = Vec::with_capacity(total);

    for k in 0..total {
        let index = k as f64 / divisions as f64;
        let time = beat_time_at(beats, index);
        if time >= 0.0 && time <= audio_len_sec {
            mini_beats.push(time);
        }
    }

    Ok(mini_beats)
}

/// Linear interpolation of the 1-based beat index grid, with linear
/// extrapolation outside the known range (edge slopes).
fn beat_time_at(beats: &[f64], index: f64) -> f64 {
    let n = beats.len();
    let position = index - 1.0;

    if position <= 0.0 {
        beats[0] + position * (beats[1] - beats[0])
    } else if position >= (n - 1) as f64 {
        beats[n - 1] + (position - (n - 1) as f64) * (beats[n - 1] - beats[n - 2])
    } else {
        let i = position.floor() as usize;
        let frac = position - i as f64;
        beats[i] + frac * (beats[i + 1] - beats[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdivision_matches_known_grid() {
        // 1 Hz beats, 2 divisions per beat: the half-beat grid, with the
        // leading extrapolated samples at 0.0 and 0.5 still inside the audio
        let beats = vec![1.0, 2.0, 3.0, 4.0];
        let mini = subdivide(&beats, 4.2, 8).unwrap();

        let expected = vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0];
        assert_eq!(mini.len(), expected.len());
        for (got, want) in mini.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trailing_extrapolation_is_clipped() {
        // Fractional index 4.5 maps to 4.5 s, outside 4.2 s of audio
        let beats = vec![1.0, 2.0, 3.0, 4.0];
        let mini = subdivide(&beats, 4.2, 8).unwrap();
        assert!(mini.iter().all(|&t| t <= 4.2));

        // With a longer recording the same sample survives
        let mini = subdivide(&beats, 5.0, 8).unwrap();
        assert!((mini.last().unwrap() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_subdivision_returns_original_beats() {
        // mini_beat_div_n = 4 is one division per beat; the edge
        // extrapolations fall outside the audio, leaving the beats themselves
        let beats = vec![0.3, 0.8, 1.3, 1.8];
        let mini = subdivide(&beats, 1.9, 4).unwrap();

        assert_eq!(mini.len(), beats.len());
        for (got, want) in mini.iter().zip(beats.iter()) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_is_monotonic_and_bounded() {
        let beats = vec![0.5, 1.1, 1.6, 2.3, 2.9, 3.4];
        let audio_len = 3.6;
        let mini = subdivide(&beats, audio_len, 32).unwrap();

        assert!(!mini.is_empty());
        for pair in mini.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(mini.iter().all(|&t| t >= 0.0 && t <= audio_len));
    }

    #[test]
    fn test_idempotent() {
        let beats = vec![0.5, 1.0, 1.5, 2.0, 2.5];
        let first = subdivide(&beats, 3.0, 32).unwrap();
        let second = subdivide(&beats, 3.0, 32).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_division_count() {
        // 32 mini-beats per 4/4 measure is 8 per beat
        let beats = vec![1.0, 2.0];
        let mini = subdivide(&beats, 10.0, 32).unwrap();
        // Samples at indices 0..3 in steps of 1/8, minus those before 0.0:
        // index 0 maps to 0.0, so all 24 samples are kept
        assert_eq!(mini.len(), 24);
        assert!((mini[1] - mini[0] - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_zero_divisions_is_an_error() {
        let beats = vec![1.0, 2.0, 3.0];
        assert!(subdivide(&beats, 4.0, 1).is_err());
        assert!(subdivide(&beats, 4.0, 0).is_err());
    }

    #[test]
    fn test_too_few_beats_is_an_error() {
        assert!(subdivide(&[], 4.0, 32).is_err());
        assert!(subdivide(&[1.0], 4.0, 32).is_err());
    }

    #[test]
    fn test_non_increasing_beats_is_an_error() {
        assert!(subdivide(&[1.0, 1.0, 2.0], 4.0, 32).is_err());
        assert!(subdivide(&[2.0, 1.0], 4.0, 32).is_err());
    }
}
