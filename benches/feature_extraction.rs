//! Feature extraction throughput.
//!
//! A preview clip is at most 30 s; the full pass (STFT, mel, beat tracking,
//! HPSS, MFCC) over one should stay well under real time.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moodtune::audio::mel::MelFilterbank;
use moodtune::audio::Stft;
use moodtune::{AudioBuffer, FeatureExtractor};

/// Chord with a click on every beat at 120 BPM
fn synthetic_clip(sample_rate: u32, seconds: f32) -> AudioBuffer {
    let n = (sample_rate as f32 * seconds) as usize;
    let beat = (sample_rate as f32 * 0.5) as usize;

    let samples = (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let chord: f64 = [220.0, 277.18, 329.63]
                .iter()
                .map(|f| (2.0 * std::f64::consts::PI * f * t).sin())
                .sum::<f64>()
                / 6.0;
            let click = if i % beat < 64 { 0.5 } else { 0.0 };
            (chord + click) as f32
        })
        .collect();

    AudioBuffer::new(samples, sample_rate)
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extraction");
    group.sample_size(10);
    let extractor = FeatureExtractor::default();

    for seconds in [5.0f32, 30.0] {
        let clip = synthetic_clip(22_050, seconds);
        group.throughput(Throughput::Elements(clip.len() as u64));
        group.bench_with_input(BenchmarkId::new("extract", seconds as u32), &clip, |b, clip| {
            b.iter(|| extractor.extract(black_box(clip)))
        });
    }
    group.finish();
}

fn bench_spectrogram(c: &mut Criterion) {
    let clip = synthetic_clip(22_050, 30.0);
    let stft = Stft::new(2048, 512);
    let filterbank = MelFilterbank::new(22_050, 2048, 128);

    c.bench_function("stft_30s", |b| {
        b.iter(|| stft.magnitude(black_box(&clip.samples), clip.sample_rate))
    });

    let spectrogram = stft.magnitude(&clip.samples, clip.sample_rate);
    let power = spectrogram.power();
    c.bench_function("mel_db_30s", |b| b.iter(|| filterbank.mel_db(black_box(&power))));
}

criterion_group!(benches, bench_full_pass, bench_spectrogram);
criterion_main!(benches);
