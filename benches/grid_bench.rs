use criterion::{black_box, criterion_group, criterion_main, Criterion};

use beatgrid::grid;
use beatgrid::tracking::{trimmed_mean_bpm, EstimatorRole};

fn bench_trimmed_mean_bpm(c: &mut Criterion) {
    // Ten minutes of 120 BPM beats with mild jitter
    let beats: Vec<f64> = (0..1200)
        .map(|i| i as f64 * 0.5 + if i % 7 == 0 { 0.01 } else { 0.0 })
        .collect();

    c.bench_function("trimmed_mean_bpm_1200_beats", |b| {
        b.iter(|| trimmed_mean_bpm(black_box(&beats), EstimatorRole::ProbabilisticBeat).unwrap())
    });
}

fn bench_mini_beat_subdivision(c: &mut Criterion) {
    let beats: Vec<f64> = (0..1200).map(|i| i as f64 * 0.5).collect();
    let audio_len_sec = 600.0;

    c.bench_function("subdivide_1200_beats_div32", |b| {
        b.iter(|| grid::subdivide(black_box(&beats), audio_len_sec, 32).unwrap())
    });
}

criterion_group!(benches, bench_trimmed_mean_bpm, bench_mini_beat_subdivision);
criterion_main!(benches);
