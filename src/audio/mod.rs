//! # Audio Loading Module
//!
//! Decodes audio files into a mono sample buffer at a configurable sampling
//! rate, ready for beat tracking. WAV files go through hound; mp3/flac/ogg and
//! friends go through Symphonia. Multi-channel input is downmixed to mono and
//! resampled with linear interpolation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use beatgrid::audio::AudioLoader;
//!
//! # fn main() -> anyhow::Result<()> {
//! let audio = AudioLoader::load_mono("song.wav", 44100)?;
//! println!("{:.1}s at {} Hz", audio.duration, audio.sample_rate);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod types;

pub use loader::AudioLoader;
pub use types::AudioData;
