pub mod beat_detector;
pub mod decoder;
pub mod features;
pub mod fft;
pub mod hpss;
pub mod mel;

pub use beat_detector::{BeatDetector, BeatTrack};
pub use decoder::AudioDecoder;
pub use features::{FeatureExtractor, FeatureVector};
pub use fft::{Spectrogram, Stft};
pub use mel::MelFilterbank;

use anyhow::Result;
use std::path::Path;

/// Decoded mono samples at a known sample rate.
///
/// Lives for a single request: created by the decoder, consumed by the
/// feature extractor, never retained.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Drop everything past `max_seconds`.
    pub fn truncate_to(&mut self, max_seconds: f32) {
        let max_samples = (max_seconds as f64 * self.sample_rate as f64) as usize;
        self.samples.truncate(max_samples);
    }

    /// Dump the buffer as a 32-bit float mono WAV file
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_duration() {
        let mut buffer = AudioBuffer::new(vec![0.0; 44_100 * 40], 44_100);
        assert!((buffer.duration_seconds() - 40.0).abs() < 1e-9);

        buffer.truncate_to(30.0);
        assert_eq!(buffer.len(), 44_100 * 30);

        // Shorter buffers are left alone
        buffer.truncate_to(60.0);
        assert_eq!(buffer.len(), 44_100 * 30);
    }

    #[test]
    fn test_write_wav_roundtrip_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.wav");

        let buffer = AudioBuffer::new(vec![0.25; 2205], 22_050);
        buffer.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.len(), 2205);
    }
}
