//! Median-filter harmonic/percussive source separation.
//!
//! Harmonic content is steady across time, so a median along the time axis
//! keeps it; percussive content is broadband in a single frame, so a median
//! along the frequency axis keeps that. Soft masks built from the two
//! filtered spectrograms split the input magnitudes.

use super::fft::{rms_from_magnitude, Spectrogram};

/// Harmonic and percussive magnitude spectrograms, same shape as the input.
pub struct HpssComponents {
    pub harmonic: Vec<Vec<f32>>,
    pub percussive: Vec<Vec<f32>>,
}

impl HpssComponents {
    /// Mean per-frame RMS of the harmonic and percussive components
    pub fn mean_rms(&self, fft_size: usize) -> (f64, f64) {
        let mean_of = |frames: &[Vec<f32>]| {
            let rms: Vec<f32> = frames.iter().map(|f| rms_from_magnitude(f, fft_size)).collect();
            crate::stats::mean(&rms)
        };
        (mean_of(&self.harmonic), mean_of(&self.percussive))
    }
}

pub fn separate(spec: &Spectrogram, kernel: usize) -> HpssComponents {
    let n_frames = spec.n_frames();
    if n_frames == 0 {
        return HpssComponents {
            harmonic: Vec::new(),
            percussive: Vec::new(),
        };
    }
    let n_bins = spec.frames[0].len();
    let half = kernel / 2;

    let mut window = Vec::with_capacity(kernel);

    // Median along time for every bin
    let mut harmonic_filtered = vec![vec![0.0f32; n_bins]; n_frames];
    for bin in 0..n_bins {
        for t in 0..n_frames {
            let start = t.saturating_sub(half);
            let end = (t + half + 1).min(n_frames);
            window.clear();
            window.extend((start..end).map(|u| spec.frames[u][bin]));
            harmonic_filtered[t][bin] = median_in_place(&mut window);
        }
    }

    // Median along frequency within every frame
    let mut percussive_filtered = vec![vec![0.0f32; n_bins]; n_frames];
    for (t, frame) in spec.frames.iter().enumerate() {
        for bin in 0..n_bins {
            let start = bin.saturating_sub(half);
            let end = (bin + half + 1).min(n_bins);
            window.clear();
            window.extend_from_slice(&frame[start..end]);
            percussive_filtered[t][bin] = median_in_place(&mut window);
        }
    }

    let mut harmonic = vec![vec![0.0f32; n_bins]; n_frames];
    let mut percussive = vec![vec![0.0f32; n_bins]; n_frames];
    for t in 0..n_frames {
        for bin in 0..n_bins {
            let h = harmonic_filtered[t][bin];
            let p = percussive_filtered[t][bin];
            let magnitude = spec.frames[t][bin];
            harmonic[t][bin] = magnitude * soft_mask(h, p);
            percussive[t][bin] = magnitude * soft_mask(p, h);
        }
    }

    HpssComponents {
        harmonic,
        percussive,
    }
}

/// Wiener-style mask `x^2 / (x^2 + reference^2)`; 0 where both vanish
fn soft_mask(x: f32, reference: f32) -> f32 {
    let scale = x.max(reference);
    if scale <= f32::MIN_POSITIVE {
        return 0.0;
    }
    let a = (x / scale).powi(2);
    let b = (reference / scale).powi(2);
    a / (a + b)
}

fn median_in_place(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let (_, median, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}
