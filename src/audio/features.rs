use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::beat_detector::BeatDetector;
use super::fft::{frame_rms, zero_crossing_rates, Stft};
use super::mel::{self, MelFilterbank};
use super::{hpss, AudioBuffer};
use crate::config::ExtractorConfig;
use crate::error::{AnalysisError, Result};
use crate::stats::{mean, percentile, round_to};

/// Guards `mean / max` of the onset envelope on silent input
pub const BEAT_STRENGTH_EPSILON: f64 = 1e-9;
/// Guards `harmonic / (harmonic + percussive)` on silent input
pub const HARMONIC_RATIO_EPSILON: f64 = 1e-9;

/// Fixed-shape summary of one audio clip.
///
/// Every value is rounded at construction so results are stable across runs
/// and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Beats per minute
    pub tempo: f64,
    /// Mean onset strength relative to its peak, 0.0-1.0
    pub beat_strength: f64,
    /// Hz
    pub spectral_centroid: f64,
    /// Hz
    pub spectral_rolloff: f64,
    /// Hz
    pub spectral_bandwidth: f64,
    /// Share of harmonic energy, 0.0-1.0
    pub harmonic_ratio: f64,
    /// Mean fraction of sign changes per frame, 0.0-1.0
    pub zero_crossing_rate: f64,
    /// Mean frame RMS amplitude
    pub rms_energy: f64,
    /// 95th minus 5th percentile of frame RMS
    pub dynamic_range: f64,
    /// Mean of the first MFCCs across frames
    pub timbre_summary: Vec<f64>,
    pub duration_seconds: f64,
    /// Mean frame RMS in dB
    pub loudness_db: f64,
}

impl FeatureVector {
    /// Mid-range vector substituted when a preview cannot be analysed.
    pub fn fallback() -> Self {
        Self {
            tempo: 120.0,
            beat_strength: 0.5,
            spectral_centroid: 2000.0,
            spectral_rolloff: 4000.0,
            spectral_bandwidth: 1500.0,
            harmonic_ratio: 0.5,
            zero_crossing_rate: 0.1,
            rms_energy: 0.1,
            dynamic_range: 0.1,
            timbre_summary: vec![0.0, 0.0, 0.0],
            duration_seconds: 0.0,
            loudness_db: -10.0,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.tempo,
            self.beat_strength,
            self.spectral_centroid,
            self.spectral_rolloff,
            self.spectral_bandwidth,
            self.harmonic_ratio,
            self.zero_crossing_rate,
            self.rms_energy,
            self.dynamic_range,
            self.duration_seconds,
            self.loudness_db,
        ]
        .iter()
        .chain(self.timbre_summary.iter())
        .all(|v| v.is_finite())
    }
}

/// Computes a [`FeatureVector`] from a decoded buffer.
///
/// Stateless apart from its configuration; one instance can serve any number
/// of buffers at any sample rate.
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Full feature pass. Fails with `Decode` for an empty buffer or a zero
    /// sample rate, and with `Analysis` if any statistic comes out non-finite.
    pub fn extract(&self, buffer: &AudioBuffer) -> Result<FeatureVector> {
        if buffer.sample_rate == 0 {
            return Err(AnalysisError::Decode("sample rate must be positive".to_string()));
        }
        if buffer.is_empty() {
            return Err(AnalysisError::Decode("signal is empty".to_string()));
        }
        if buffer.samples.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::Analysis("signal contains non-finite samples".to_string()));
        }

        let cfg = &self.config;
        let sr = buffer.sample_rate;
        let samples = &buffer.samples;

        let stft = Stft::new(cfg.fft_size, cfg.hop_length);
        let spectrogram = stft.magnitude(samples, sr);
        debug!("STFT: {} frames x {} bins", spectrogram.n_frames(), spectrogram.n_bins());

        // Rhythm
        let filterbank = MelFilterbank::new(sr, cfg.fft_size, cfg.n_mels);
        let mel_db = filterbank.mel_db(&spectrogram.power());
        let onset = BeatDetector::onset_strength(&mel_db);
        let detector = BeatDetector::new(sr, cfg.hop_length, cfg.start_bpm, cfg.max_bpm);
        let beats = detector.track(&onset);

        let onset_peak = onset.iter().fold(0.0f32, |a, &b| a.max(b)) as f64;
        let beat_strength = mean(&onset) / (onset_peak + BEAT_STRENGTH_EPSILON);

        // Spectral shape
        let centroids = spectrogram.centroids();
        let rolloffs = spectrogram.rolloffs(cfg.rolloff_percent);
        let bandwidths = spectrogram.bandwidths(&centroids);

        // Harmonic / percussive balance
        let components = hpss::separate(&spectrogram, cfg.hpss_kernel);
        let (harmonic_rms, percussive_rms) = components.mean_rms(cfg.fft_size);
        let harmonic_ratio =
            harmonic_rms / (harmonic_rms + percussive_rms + HARMONIC_RATIO_EPSILON);

        // Loudness
        let zcr = zero_crossing_rates(samples, cfg.fft_size, cfg.hop_length);
        let rms = frame_rms(samples, cfg.fft_size, cfg.hop_length);
        let dynamic_range = percentile(&rms, 95.0) - percentile(&rms, 5.0);
        let loudness_db = mean(&mel::amplitude_to_db(&rms));

        // Timbre
        let coefficients = mel::mfcc(&mel_db, cfg.n_mfcc);
        let timbre_summary: Vec<f64> = (0..cfg.n_mfcc)
            .map(|k| {
                let column: Vec<f32> = coefficients.iter().map(|frame| frame[k]).collect();
                round_to(mean(&column), 4)
            })
            .collect();

        let features = FeatureVector {
            tempo: round_to(beats.tempo as f64, 2),
            beat_strength: round_to(beat_strength, 3),
            spectral_centroid: round_to(mean(&centroids), 2),
            spectral_rolloff: round_to(mean(&rolloffs), 2),
            spectral_bandwidth: round_to(mean(&bandwidths), 2),
            harmonic_ratio: round_to(harmonic_ratio, 3),
            zero_crossing_rate: round_to(mean(&zcr), 4),
            rms_energy: round_to(mean(&rms), 4),
            dynamic_range: round_to(dynamic_range, 4),
            timbre_summary,
            duration_seconds: round_to(buffer.duration_seconds(), 2),
            loudness_db: round_to(loudness_db, 1),
        };

        if !features.is_finite() {
            return Err(AnalysisError::Analysis(
                "feature pass produced non-finite values".to_string(),
            ));
        }

        info!(
            "Extracted features: {:.1} BPM, {} beats, centroid {:.0}Hz, rms {:.4} over {:.2}s",
            features.tempo,
            beats.beat_frames.len(),
            features.spectral_centroid,
            features.rms_energy,
            features.duration_seconds
        );

        Ok(features)
    }

    /// Feature pass that never fails: any error is logged and replaced by
    /// [`FeatureVector::fallback`]. The flag reports whether that happened.
    pub fn extract_or_fallback(&self, buffer: Result<AudioBuffer>) -> (FeatureVector, bool) {
        match buffer.and_then(|b| self.extract(&b)) {
            Ok(features) => (features, false),
            Err(e) => {
                warn!("Feature extraction failed, using fallback features: {}", e);
                (FeatureVector::fallback(), true)
            }
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32, amplitude: f32) -> AudioBuffer {
        let n = (sample_rate as f32 * seconds) as usize;
        let samples = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * freq as f64 * i as f64 / sample_rate as f64;
                amplitude * phase.sin() as f32
            })
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_empty_buffer_is_decode_error() {
        let extractor = FeatureExtractor::default();
        let result = extractor.extract(&AudioBuffer::new(Vec::new(), 22_050));
        assert!(matches!(result, Err(AnalysisError::Decode(_))));

        let result = extractor.extract(&AudioBuffer::new(vec![0.1; 100], 0));
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_non_finite_samples_are_analysis_error() {
        let extractor = FeatureExtractor::default();
        let result = extractor.extract(&AudioBuffer::new(vec![0.0, f32::NAN, 0.0], 22_050));
        assert!(matches!(result, Err(AnalysisError::Analysis(_))));
    }

    #[test]
    fn test_tone_features() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&sine(1000.0, 22_050, 2.0, 0.5)).unwrap();

        assert!((features.spectral_centroid - 1000.0).abs() < 150.0, "{:?}", features);
        assert!((features.rms_energy - 0.3536).abs() < 0.03, "{:?}", features);
        assert!(features.harmonic_ratio > 0.7, "{:?}", features);
        assert!(features.tempo > 0.0);
        assert!((0.0..=1.0).contains(&features.beat_strength));
        assert!((0.0..=1.0).contains(&features.zero_crossing_rate));
        assert_eq!(features.timbre_summary.len(), 3);
        assert_eq!(features.duration_seconds, 2.0);
    }

    #[test]
    fn test_silence_stays_finite() {
        let extractor = FeatureExtractor::default();
        let features = extractor
            .extract(&AudioBuffer::new(vec![0.0; 22_050], 22_050))
            .unwrap();

        assert_eq!(features.tempo, 120.0);
        assert_eq!(features.beat_strength, 0.0);
        assert_eq!(features.harmonic_ratio, 0.0);
        assert_eq!(features.rms_energy, 0.0);
        assert_eq!(features.dynamic_range, 0.0);
        assert_eq!(features.loudness_db, -100.0);
    }

    #[test]
    fn test_louder_signal_has_more_energy() {
        let extractor = FeatureExtractor::default();
        let quiet = extractor.extract(&sine(440.0, 22_050, 1.0, 0.1)).unwrap();
        let loud = extractor.extract(&sine(440.0, 22_050, 1.0, 0.8)).unwrap();
        assert!(loud.rms_energy > quiet.rms_energy);
        assert!(loud.loudness_db > quiet.loudness_db);
    }

    #[test]
    fn test_fallback_on_error() {
        let extractor = FeatureExtractor::default();
        let (features, used_fallback) =
            extractor.extract_or_fallback(Err(AnalysisError::Decode("bad bytes".to_string())));
        assert!(used_fallback);
        assert_eq!(features, FeatureVector::fallback());
        assert_eq!(features.tempo, 120.0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(FeatureVector::fallback()).unwrap();
        assert_eq!(json["beatStrength"], 0.5);
        assert_eq!(json["timbreSummary"].as_array().unwrap().len(), 3);
    }
}
