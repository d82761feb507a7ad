//! Mel filterbank, decibel conversion and MFCC.
//!
//! The filterbank uses the Slaney mel scale (linear below 1 kHz, logarithmic
//! above) with area-normalised triangles.

/// Floor for power values before taking the log
pub const POWER_DB_AMIN: f32 = 1e-10;
/// Floor for amplitude values before taking the log
pub const AMPLITUDE_DB_AMIN: f32 = 1e-5;
/// Dynamic range kept below the peak when converting to dB
pub const TOP_DB: f32 = 80.0;

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

pub struct MelFilterbank {
    /// `n_mels` rows of `n_fft / 2 + 1` weights
    weights: Vec<Vec<f32>>,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, fft_size: usize, n_mels: usize) -> Self {
        let n_bins = fft_size / 2 + 1;
        let f_max = sample_rate as f32 / 2.0;

        let fft_freqs: Vec<f32> = (0..n_bins)
            .map(|k| k as f32 * sample_rate as f32 / fft_size as f32)
            .collect();

        let mel_max = hz_to_mel(f_max);
        let mel_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
            .collect();

        let weights = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
                let enorm = 2.0 / (upper - lower);

                fft_freqs
                    .iter()
                    .map(|&f| {
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        rising.min(falling).max(0.0) * enorm
                    })
                    .collect()
            })
            .collect();

        Self { weights }
    }

    pub fn n_mels(&self) -> usize {
        self.weights.len()
    }

    /// Project one power-spectrum frame onto the mel bands
    pub fn apply(&self, power_frame: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .map(|row| row.iter().zip(power_frame.iter()).map(|(w, p)| w * p).sum())
            .collect()
    }

    /// Mel power spectrogram converted to dB, frames x bands
    pub fn mel_db(&self, power: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let mel: Vec<Vec<f32>> = power.iter().map(|frame| self.apply(frame)).collect();
        power_to_db(&mel)
    }
}

/// `10 * log10(max(amin, S))`, floored at `peak - TOP_DB`
pub fn power_to_db(frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let mut db: Vec<Vec<f32>> = frames
        .iter()
        .map(|frame| frame.iter().map(|&p| 10.0 * p.max(POWER_DB_AMIN).log10()).collect())
        .collect();
    floor_to_top_db(&mut db);
    db
}

/// `20 * log10(max(amin, A))`, floored at `peak - TOP_DB`
pub fn amplitude_to_db(values: &[f32]) -> Vec<f32> {
    let mut db = vec![values
        .iter()
        .map(|&a| 20.0 * a.max(AMPLITUDE_DB_AMIN).log10())
        .collect::<Vec<f32>>()];
    floor_to_top_db(&mut db);
    db.pop().unwrap_or_default()
}

fn floor_to_top_db(db: &mut [Vec<f32>]) {
    let peak = db
        .iter()
        .flat_map(|frame| frame.iter())
        .fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    if !peak.is_finite() {
        return;
    }

    let floor = peak - TOP_DB;
    for value in db.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = value.max(floor);
    }
}

/// Orthonormal DCT-II of `input`, keeping the first `n_out` coefficients
pub fn dct_ortho(input: &[f32], n_out: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }

    (0..n_out)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (2 * i + 1) as f32 / (2 * n) as f32)
                        .cos()
                })
                .sum();
            let scale = if k == 0 {
                (1.0 / n as f32).sqrt()
            } else {
                (2.0 / n as f32).sqrt()
            };
            sum * scale
        })
        .collect()
}

/// Per-frame MFCCs from a mel dB spectrogram
pub fn mfcc(mel_db: &[Vec<f32>], n_mfcc: usize) -> Vec<Vec<f32>> {
    mel_db.iter().map(|frame| dct_ortho(frame, n_mfcc)).collect()
}
