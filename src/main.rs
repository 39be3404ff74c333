use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use beatgrid::{pipeline, Config};

#[derive(Parser)]
#[command(
    name = "beatgrid",
    version,
    about = "Extract beat and mini-beat grids from audio recordings",
    long_about = "Beatgrid runs a three-estimator beat tracking ensemble over an audio file, \
refines the result around the consensus tempo, and subdivides the beats into a mini-beat grid \
for transcription."
)]
struct Cli {
    /// Audio file path (WAV, MP3, FLAC, ...)
    #[arg(short, long)]
    audio: PathBuf,

    /// Mini-beats per 4/4 measure
    #[arg(short, long, default_value_t = 32)]
    mini_beat_div: u32,

    /// Ensemble worker pool size; 0 runs the estimators sequentially
    #[arg(short, long, default_value_t = 3)]
    workers: usize,

    /// Thread budget inside each estimator
    #[arg(short, long, default_value_t = 3)]
    threads: usize,

    /// Only print the beat grid, skip mini-beat subdivision
    #[arg(long)]
    beats_only: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    info!("Starting beatgrid v{}", env!("CARGO_PKG_VERSION"));
    info!("Audio: {:?}", cli.audio);

    // Load configuration, then apply CLI overrides
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => Config::default(),
    };
    config.tracking.parallel_workers = cli.workers;
    config.tracking.num_threads = cli.threads;
    config.grid.mini_beat_div_n = cli.mini_beat_div;

    let (beats, audio_len_sec) = pipeline::extract_beat(&cli.audio, &config)?;
    info!("Tracked {} beats over {:.1}s", beats.len(), audio_len_sec);

    if cli.beats_only {
        for beat in &beats {
            println!("{:.4}", beat);
        }
        return Ok(());
    }

    let mini_beats =
        pipeline::extract_mini_beat_from_beats(&beats, audio_len_sec, config.grid.mini_beat_div_n)?;
    info!("Subdivided into {} mini-beats", mini_beats.len());

    for mini_beat in &mini_beats {
        println!("{:.4}", mini_beat);
    }

    Ok(())
}
