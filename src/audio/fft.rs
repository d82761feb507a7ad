use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Short-time Fourier transform over a whole buffer.
///
/// Frames are centred: the signal is padded by `fft_size / 2` on both sides
/// so frame `t` is centred on sample `t * hop_length`.
pub struct Stft {
    fft_size: usize,
    hop_length: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

/// Magnitude spectrogram, one `fft_size / 2 + 1` bin vector per frame.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub fft_size: usize,
}

impl Stft {
    pub fn new(fft_size: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            hop_length,
            fft,
            window: Self::hann_window(fft_size),
        }
    }

    // Periodic Hann, the usual choice for STFT analysis
    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    pub fn magnitude(&self, samples: &[f32], sample_rate: u32) -> Spectrogram {
        let padded = pad_center(samples, self.fft_size / 2);
        let n_frames = frame_count(padded.len(), self.fft_size, self.hop_length);
        let n_bins = self.fft_size / 2 + 1;

        let mut frames = Vec::with_capacity(n_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_size];

        for t in 0..n_frames {
            let start = t * self.hop_length;
            let frame = &padded[start..start + self.fft_size];

            for (slot, (&x, &w)) in buffer.iter_mut().zip(frame.iter().zip(self.window.iter())) {
                *slot = Complex::new(x * w, 0.0);
            }
            self.fft.process(&mut buffer);

            frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        }

        Spectrogram {
            frames,
            sample_rate,
            fft_size: self.fft_size,
        }
    }
}

impl Spectrogram {
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn n_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_size as f32
    }

    /// Per-frame magnitude-weighted mean frequency (Hz)
    pub fn centroids(&self) -> Vec<f32> {
        self.frames
            .iter()
            .map(|frame| {
                let total: f32 = frame.iter().sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let weighted: f32 = frame
                    .iter()
                    .enumerate()
                    .map(|(k, &m)| self.bin_frequency(k) * m)
                    .sum();
                weighted / total
            })
            .collect()
    }

    /// Per-frame frequency below which `percent` of the magnitude lies (Hz)
    pub fn rolloffs(&self, percent: f32) -> Vec<f32> {
        self.frames
            .iter()
            .map(|frame| {
                let total: f32 = frame.iter().sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let threshold = total * percent;
                let mut cumulative = 0.0;
                for (k, &m) in frame.iter().enumerate() {
                    cumulative += m;
                    if cumulative >= threshold {
                        return self.bin_frequency(k);
                    }
                }
                self.bin_frequency(frame.len() - 1)
            })
            .collect()
    }

    /// Per-frame second-order spectral bandwidth around `centroids` (Hz)
    pub fn bandwidths(&self, centroids: &[f32]) -> Vec<f32> {
        self.frames
            .iter()
            .zip(centroids.iter())
            .map(|(frame, &centroid)| {
                let total: f32 = frame.iter().sum();
                if total <= 0.0 {
                    return 0.0;
                }
                let spread: f32 = frame
                    .iter()
                    .enumerate()
                    .map(|(k, &m)| (m / total) * (self.bin_frequency(k) - centroid).powi(2))
                    .sum();
                spread.sqrt()
            })
            .collect()
    }

    /// Power spectrogram (|X|^2) per frame
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|&m| m * m).collect())
            .collect()
    }
}

/// RMS of a frame given its one-sided magnitude spectrum (Parseval).
///
/// Lets the HPSS step measure component energy without an inverse STFT.
pub fn rms_from_magnitude(frame: &[f32], fft_size: usize) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }

    let last = frame.len() - 1;
    let mut energy: f32 = frame
        .iter()
        .enumerate()
        .map(|(k, &m)| {
            let p = m * m;
            // DC and Nyquist appear once in the full spectrum
            if k == 0 || (k == last && fft_size % 2 == 0) {
                0.5 * p
            } else {
                p
            }
        })
        .sum();
    energy *= 2.0;

    (energy / (fft_size as f32 * fft_size as f32)).sqrt()
}

/// Per-frame RMS amplitude over centred frames of the raw signal
pub fn frame_rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let padded = pad_center(samples, frame_length / 2);
    let n_frames = frame_count(padded.len(), frame_length, hop_length);

    (0..n_frames)
        .map(|t| {
            let frame = &padded[t * hop_length..t * hop_length + frame_length];
            (frame.iter().map(|x| x * x).sum::<f32>() / frame_length as f32).sqrt()
        })
        .collect()
}

/// Per-frame fraction of adjacent sample pairs that change sign
pub fn zero_crossing_rates(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let padded = pad_center(samples, frame_length / 2);
    let n_frames = frame_count(padded.len(), frame_length, hop_length);

    (0..n_frames)
        .map(|t| {
            let frame = &padded[t * hop_length..t * hop_length + frame_length];
            let crossings = frame
                .windows(2)
                .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
                .count();
            crossings as f32 / frame_length as f32
        })
        .collect()
}

/// Reflect-pad `pad` samples on each side; zero-pad when the signal is too
/// short to reflect.
pub fn pad_center(samples: &[f32], pad: usize) -> Vec<f32> {
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);

    if samples.len() > pad {
        padded.extend(samples[1..=pad].iter().rev());
        padded.extend_from_slice(samples);
        let n = samples.len();
        padded.extend(samples[n - 1 - pad..n - 1].iter().rev());
    } else {
        padded.resize(pad, 0.0);
        padded.extend_from_slice(samples);
        padded.resize(samples.len() + 2 * pad, 0.0);
    }

    padded
}

pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len < frame_length {
        0
    } else {
        1 + (len - frame_length) / hop_length
    }
}
