use std::path::PathBuf;

/// Decoded audio with metadata, immutable once loaded
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);

        for chunk in self.samples.chunks(self.channels as usize) {
            let sum: f32 = chunk.iter().sum();
            mono.push(sum / self.channels as f32);
        }

        mono
    }

    /// Get time in seconds for a sample index
    pub fn time_for_sample(&self, sample_index: usize) -> f64 {
        sample_index as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_conversion() {
        let stereo_samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // L, R, L, R, L, R
        let audio_data = AudioData {
            samples: stereo_samples,
            sample_rate: 44100,
            channels: 2,
            duration: 1.0,
            file_path: PathBuf::from("test.wav"),
        };

        let mono = audio_data.mono_samples();
        assert_eq!(mono, vec![1.5, 3.5, 5.5]); // Average of L and R channels
    }

    #[test]
    fn test_mono_passthrough() {
        let audio_data = AudioData {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 100,
            channels: 1,
            duration: 0.03,
            file_path: PathBuf::from("test.wav"),
        };

        assert_eq!(audio_data.mono_samples(), audio_data.samples);
        assert_eq!(audio_data.time_for_sample(200), 2.0);
    }
}
