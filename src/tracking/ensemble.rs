use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{EnsembleError, Result, TrackingError};
use crate::tracking::estimator::{BeatTracker, EstimatorRole};

/// Hard ceiling on the total wait for parallel ensemble dispatch
pub const ENSEMBLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Second-pass tempo tolerance: the refined search band is
/// `[consensus / 1.38, consensus * 1.38]`
pub const TEMPO_TOLERANCE: f64 = 1.38;

const ROLES: [EstimatorRole; 3] = [
    EstimatorRole::ConstrainedDownbeat,
    EstimatorRole::ProbabilisticBeat,
    EstimatorRole::SimpleBeat,
];

/// Three-estimator consensus beat tracker.
///
/// Runs the downbeat-constrained, probabilistic, and simple estimators over
/// the same audio, averages their trimmed-mean tempo estimates, and re-runs
/// the downbeat estimator with the search band narrowed around the consensus.
/// The three first-pass estimators disagree in plausible ways (tempo octave,
/// false positives); narrowing to the empirical consensus before a final
/// decode stabilizes the result without per-track BPM tuning.
pub struct EnsembleTracker {
    tracker: Arc<dyn BeatTracker>,
    parallel_workers: usize,
    min_bpm: f64,
    max_bpm: f64,
    deadline: Duration,
}

impl EnsembleTracker {
    /// Create an ensemble over the given backend.
    ///
    /// `parallel_workers == 0` runs the first pass sequentially in-process;
    /// otherwise the three estimator jobs go to a worker pool of exactly that
    /// size. `min_bpm`/`max_bpm` bound the first-pass downbeat estimator.
    pub fn new(
        tracker: Arc<dyn BeatTracker>,
        parallel_workers: usize,
        min_bpm: f64,
        max_bpm: f64,
    ) -> Self {
        Self {
            tracker,
            parallel_workers,
            min_bpm,
            max_bpm,
            deadline: ENSEMBLE_TIMEOUT,
        }
    }

    /// Override the dispatch deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run the full two-pass consensus procedure and return the refined
    /// beat-time array.
    pub fn process(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f64>> {
        let results = if self.parallel_workers == 0 {
            debug!("Running beat tracking sequentially");
            self.run_sequential(samples, sample_rate)?
        } else {
            debug!(
                "Dispatching beat tracking jobs to {} worker(s)",
                self.parallel_workers
            );
            self.run_parallel(samples, sample_rate)?
        };

        let mut bpm_sum = 0.0;
        for role in ROLES {
            let beats = &results[&role];
            let bpm = trimmed_mean_bpm(beats, role)?;
            debug!("Estimator {}: {} beats, {:.1} BPM", role, beats.len(), bpm);
            bpm_sum += bpm;
        }
        let consensus_bpm = bpm_sum / ROLES.len() as f64;

        debug!(
            "Consensus tempo {:.1} BPM, refining with band [{:.1}, {:.1}]",
            consensus_bpm,
            consensus_bpm / TEMPO_TOLERANCE,
            consensus_bpm * TEMPO_TOLERANCE
        );

        self.tracker.track_downbeats(
            samples,
            sample_rate,
            consensus_bpm / TEMPO_TOLERANCE,
            consensus_bpm * TEMPO_TOLERANCE,
        )
    }

    fn run_one(
        &self,
        role: EstimatorRole,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Vec<f64>> {
        match role {
            EstimatorRole::ConstrainedDownbeat => {
                self.tracker
                    .track_downbeats(samples, sample_rate, self.min_bpm, self.max_bpm)
            }
            EstimatorRole::ProbabilisticBeat => self.tracker.track_beats(samples, sample_rate),
            EstimatorRole::SimpleBeat => self.tracker.track_beats_simple(samples, sample_rate),
        }
    }

    fn run_sequential(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<HashMap<EstimatorRole, Vec<f64>>> {
        let mut results = HashMap::new();
        for role in ROLES {
            results.insert(role, self.run_one(role, samples, sample_rate)?);
        }
        Ok(results)
    }

    /// Role-tagged scatter/gather: results arrive in completion order but are
    /// keyed by role, so the consensus computation is order-independent.
    fn run_parallel(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<HashMap<EstimatorRole, Vec<f64>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_workers)
            .panic_handler(|_| tracing::warn!("ensemble worker panicked"))
            .build()
            .map_err(|e| EnsembleError::PoolBuild {
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel();
        for role in ROLES {
            let tx = tx.clone();
            let tracker = Arc::clone(&self.tracker);
            let (min_bpm, max_bpm) = (self.min_bpm, self.max_bpm);
            // Each worker operates on its own copy of the audio
            let audio = samples.to_vec();

            pool.spawn(move || {
                let result = match role {
                    EstimatorRole::ConstrainedDownbeat => {
                        tracker.track_downbeats(&audio, sample_rate, min_bpm, max_bpm)
                    }
                    EstimatorRole::ProbabilisticBeat => tracker.track_beats(&audio, sample_rate),
                    EstimatorRole::SimpleBeat => tracker.track_beats_simple(&audio, sample_rate),
                };
                let _ = tx.send((role, result));
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.deadline;
        let mut results = HashMap::new();

        while results.len() < ROLES.len() {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(EnsembleError::Timeout {
                    seconds: self.deadline.as_secs(),
                })?;

            match rx.recv_timeout(remaining) {
                Ok((role, result)) => {
                    debug!("Job {} finished", role);
                    results.insert(role, result?);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    return Err(EnsembleError::Timeout {
                        seconds: self.deadline.as_secs(),
                    }
                    .into());
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    let missing = ROLES
                        .iter()
                        .find(|role| !results.contains_key(*role))
                        .copied()
                        .unwrap_or(EstimatorRole::ConstrainedDownbeat);
                    return Err(EnsembleError::WorkerFailed { role: missing }.into());
                }
            }
        }

        Ok(results)
    }
}

/// Tempo estimate from a beat-time array: `60 / trimmed_mean(intervals)`.
///
/// The sorted inter-beat intervals are sliced with bounds derived from the
/// *beat* count N, `[floor(0.2 N), floor(0.8 N))` clamped to the interval
/// count, so the fastest and slowest outliers (octave errors, missed beats)
/// drop out. Always non-empty for N >= 2.
pub fn trimmed_mean_bpm(beats: &[f64], role: EstimatorRole) -> Result<f64> {
    let n = beats.len();
    if n < 2 {
        return Err(TrackingError::DegenerateResult { role, count: n }.into());
    }

    let mut intervals: Vec<f64> = beats.windows(2).map(|pair| pair[1] - pair[0]).collect();
    if intervals.iter().any(|&gap| gap <= 0.0) {
        return Err(TrackingError::NonIncreasingBeats {
            details: format!("{} estimator output", role),
        }
        .into());
    }

    intervals.sort_by(|a, b| a.total_cmp(b));
    let lo = (n as f64 * 0.2) as usize;
    let hi = ((n as f64 * 0.8) as usize).min(intervals.len());
    let kept = &intervals[lo..hi];

    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    Ok(60.0 / mean)
}
