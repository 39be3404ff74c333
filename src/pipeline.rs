use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    audio::AudioLoader,
    config::Config,
    error::Result,
    grid,
    tracking::{BeatTracker, EnsembleTracker, SpectralBeatTracker},
};

/// Extract beat positions (in seconds) from an audio file.
///
/// Loads the audio at the configured sampling rate, runs the three-estimator
/// consensus procedure, and returns the refined beat-time array together with
/// the audio length in seconds.
pub fn extract_beat<P: AsRef<Path>>(audio_path: P, config: &Config) -> Result<(Vec<f64>, f64)> {
    config.validate()?;
    let audio_path = audio_path.as_ref();

    debug!("Loading audio: {:?}", audio_path);
    let audio = AudioLoader::load_mono(audio_path, config.audio.sampling_rate)?;
    info!(
        "Loaded {:.1}s of audio at {} Hz",
        audio.duration, audio.sample_rate
    );

    debug!("Running beat tracking");
    let tracker =
        Arc::new(SpectralBeatTracker::new(config.tracking.num_threads)) as Arc<dyn BeatTracker>;
    let ensemble = EnsembleTracker::new(
        tracker,
        config.tracking.parallel_workers,
        config.tracking.min_bpm,
        config.tracking.max_bpm,
    );
    let beats = ensemble.process(&audio.samples, audio.sample_rate)?;
    info!("Tracked {} beats", beats.len());

    Ok((beats, audio.duration))
}

/// Subdivide a beat array into mini-beats bounded by the audio duration.
///
/// `mini_beat_div_n` is the number of mini-beats per 4/4 measure.
pub fn extract_mini_beat_from_beats(
    beat_arr: &[f64],
    audio_len_sec: f64,
    mini_beat_div_n: u32,
) -> Result<Vec<f64>> {
    grid::subdivide(beat_arr, audio_len_sec, mini_beat_div_n)
}

/// Extract the mini-beat grid straight from an audio file.
///
/// Composes [`extract_beat`] and [`extract_mini_beat_from_beats`].
pub fn extract_mini_beat_from_audio<P: AsRef<Path>>(
    audio_path: P,
    config: &Config,
) -> Result<Vec<f64>> {
    debug!("Extracting beat grid");
    let (beats, audio_len_sec) = extract_beat(audio_path, config)?;

    debug!("Extracting mini-beat grid");
    extract_mini_beat_from_beats(&beats, audio_len_sec, config.grid.mini_beat_div_n)
}
