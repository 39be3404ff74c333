use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file, downmix to mono, and resample to `sampling_rate`.
    ///
    /// Returns the resampled mono signal; duration is
    /// `samples.len() / sampling_rate`.
    pub fn load_mono<P: AsRef<Path>>(path: P, sampling_rate: u32) -> Result<AudioData> {
        let raw = Self::load(&path)?;
        let path = path.as_ref();

        let mono = raw.mono_samples();
        if mono.is_empty() {
            return Err(AudioError::EmptySignal {
                path: path.display().to_string(),
            }
            .into());
        }

        let samples = if raw.sample_rate == sampling_rate {
            mono
        } else {
            tracing::debug!(
                "Resampling {} Hz -> {} Hz ({} samples)",
                raw.sample_rate,
                sampling_rate,
                mono.len()
            );
            resample_linear(&mono, raw.sample_rate, sampling_rate)
        };

        let duration = samples.len() as f64 / sampling_rate as f64;

        Ok(AudioData {
            samples,
            sample_rate: sampling_rate,
            channels: 1,
            duration,
            file_path: path.to_path_buf(),
        })
    }

    /// Load an audio file and return raw interleaved audio data
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::load_wav(path),
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::load_with_symphonia(path),
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Load WAV files using the hound crate (most reliable for WAV)
    fn load_wav(path: &Path) -> Result<AudioData> {
        let reader = hound::WavReader::open(path).map_err(|_| AudioError::LoadFailed {
            path: path.display().to_string(),
        })?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| AudioError::LoadFailed {
                    path: path.display().to_string(),
                })?,
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                let ints: std::result::Result<Vec<i32>, _> = reader.into_samples().collect();

                ints.map_err(|_| AudioError::LoadFailed {
                    path: path.display().to_string(),
                })?
                .into_iter()
                .map(|sample| Self::int_to_float(sample, bit_depth))
                .collect()
            }
        };

        let duration = samples.len() as f64 / (sample_rate * channels as u32) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path.to_path_buf(),
        })
    }

    /// Load various formats using Symphonia
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let file = File::open(path).map_err(|_| AudioError::LoadFailed {
            path: path.display().to_string(),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            if let Some(extension_str) = extension.to_str() {
                hint.with_extension(extension_str);
            }
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string(),
            })?;

        let mut format = probed.format;

        // Find the first audio track with a known (decodable) codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::LoadFailed {
                path: path.display().to_string(),
            })?;

        let track_id = track.id;

        let codec_params = &track.codec_params;
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No sample rate found".to_string(),
            })?;

        let channels = codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(codec_params, &dec_opts)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string(),
            })?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(_)) => break, // End of stream
                Err(_) => break,
            };

            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    Self::convert_audio_buffer_to_f32(&decoded, &mut samples);
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        let duration = samples.len() as f64 / (sample_rate * channels as u32) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
            file_path: path.to_path_buf(),
        })
    }

    /// Convert integer sample to float (-1.0 to 1.0)
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => (sample as f32 - 128.0) / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0, // Default to 16-bit
        }
    }

    /// Convert Symphonia audio buffer to f32 samples
    fn convert_audio_buffer_to_f32(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::F32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.capacity();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        let channel_buf = buf.chan(ch);
                        if frame_idx < channel_buf.len() {
                            output.push(channel_buf[frame_idx]);
                        }
                    }
                }
            }
            AudioBufferRef::F64(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.capacity();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        let channel_buf = buf.chan(ch);
                        if frame_idx < channel_buf.len() {
                            output.push(channel_buf[frame_idx] as f32);
                        }
                    }
                }
            }
            AudioBufferRef::S32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.capacity();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        let channel_buf = buf.chan(ch);
                        if frame_idx < channel_buf.len() {
                            output.push(channel_buf[frame_idx] as f32 / 2147483648.0);
                        }
                    }
                }
            }
            AudioBufferRef::S16(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.capacity();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        let channel_buf = buf.chan(ch);
                        if frame_idx < channel_buf.len() {
                            output.push(channel_buf[frame_idx] as f32 / 32768.0);
                        }
                    }
                }
            }
            _ => {
                tracing::warn!("Unsupported audio buffer format, skipping packet");
            }
        }
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}

/// Linear resampling of a mono signal from `from_rate` to `to_rate`
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).floor() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos.floor() as usize;
        let frac = (pos - idx as f64) as f32;

        let a = samples[idx.min(samples.len() - 1)];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_format_support() {
        assert!(AudioLoader::is_format_supported("wav"));
        assert!(AudioLoader::is_format_supported("mp3"));
        assert!(AudioLoader::is_format_supported("FLAC"));
        assert!(!AudioLoader::is_format_supported("xyz"));
    }

    #[test]
    fn test_int_to_float_conversion() {
        assert_eq!(AudioLoader::int_to_float(0, 16), 0.0);
        assert_eq!(AudioLoader::int_to_float(32767, 16), 32767.0 / 32768.0);
        assert_eq!(AudioLoader::int_to_float(-32768, 16), -1.0);

        assert_eq!(AudioLoader::int_to_float(128, 8), 0.0);
        assert_eq!(AudioLoader::int_to_float(255, 8), 127.0 / 128.0);
        assert_eq!(AudioLoader::int_to_float(0, 8), -1.0);
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test.xyz");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"dummy content").unwrap();

        let result = AudioLoader::load(&file_path);
        assert!(result.is_err());

        if let Err(crate::error::BeatgridError::Audio(AudioError::UnsupportedFormat { format })) =
            result
        {
            assert_eq!(format, "xyz");
        } else {
            panic!("Expected UnsupportedFormat error");
        }
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.0, 0.5, 1.0, 0.5];
        assert_eq!(resample_linear(&samples, 100, 100), samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample_linear(&samples, 200, 100);
        assert_eq!(out.len(), 50);
        // A linear ramp stays a linear ramp under linear resampling
        assert!((out[10] - samples[20]).abs() < 1e-6);
    }

    #[test]
    fn test_load_mono_wav_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&file_path, spec).unwrap();
        for i in 0..22050u32 {
            let t = i as f32 / 22050.0;
            let v = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5 * 32767.0) as i16;
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let audio = AudioLoader::load_mono(&file_path, 44100).unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 44100);
        // One second of audio, within resampler truncation
        assert!((audio.duration - 1.0).abs() < 0.01);
    }
}
