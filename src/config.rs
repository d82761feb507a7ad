use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Frame and filterbank parameters for the feature pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// STFT size in samples (power of two)
    pub fft_size: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Mel bands used for onset strength and MFCC
    pub n_mels: usize,
    /// Cepstral coefficients kept in the timbre summary
    pub n_mfcc: usize,
    /// Fraction of spectral magnitude below the rolloff frequency
    pub rolloff_percent: f32,
    /// Median filter length (frames / bins) for harmonic/percussive separation
    pub hpss_kernel: usize,
    /// Centre of the tempo prior in BPM
    pub start_bpm: f32,
    /// Upper bound on tempo candidates in BPM
    pub max_bpm: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            hop_length: 512,
            n_mels: 128,
            n_mfcc: 3,
            rolloff_percent: 0.85,
            hpss_kernel: 31,
            start_bpm: 120.0,
            max_bpm: 320.0,
        }
    }
}

/// Runtime configuration for the analysis pipeline.
///
/// Stored as JSON; every field is optional in the file and falls back to its
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Directory that receives scoped temp copies of incoming audio
    pub temp_dir: PathBuf,
    /// Streaming previews are truncated to this many seconds
    pub preview_max_seconds: f32,
    /// Uploads are resampled to this rate before analysis
    pub upload_sample_rate: u32,
    /// Uploads are truncated to this many seconds
    pub upload_max_seconds: f32,
    pub extractor: ExtractorConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("moodtune-audio"),
            preview_max_seconds: 30.0,
            upload_sample_rate: 22_050,
            upload_max_seconds: 600.0,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(&path)?;
        let config: AnalysisConfig = serde_json::from_str(&json)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let ex = &self.extractor;

        if ex.fft_size == 0 || !ex.fft_size.is_power_of_two() {
            return Err(AnalysisError::Config(format!(
                "fft_size must be a power of two, got {}",
                ex.fft_size
            )));
        }
        if ex.hop_length == 0 || ex.hop_length > ex.fft_size {
            return Err(AnalysisError::Config(format!(
                "hop_length must be in 1..={}, got {}",
                ex.fft_size, ex.hop_length
            )));
        }
        if ex.n_mels == 0 || ex.n_mfcc == 0 || ex.n_mfcc > ex.n_mels {
            return Err(AnalysisError::Config(format!(
                "need 0 < n_mfcc <= n_mels, got n_mfcc={} n_mels={}",
                ex.n_mfcc, ex.n_mels
            )));
        }
        if !(ex.rolloff_percent > 0.0 && ex.rolloff_percent < 1.0) {
            return Err(AnalysisError::Config(format!(
                "rolloff_percent must be in (0, 1), got {}",
                ex.rolloff_percent
            )));
        }
        if ex.hpss_kernel == 0 {
            return Err(AnalysisError::Config("hpss_kernel must be positive".to_string()));
        }
        if ex.start_bpm <= 0.0 || ex.max_bpm <= ex.start_bpm {
            return Err(AnalysisError::Config(format!(
                "need 0 < start_bpm < max_bpm, got {} / {}",
                ex.start_bpm, ex.max_bpm
            )));
        }
        if self.preview_max_seconds <= 0.0 || self.upload_max_seconds <= 0.0 {
            return Err(AnalysisError::Config(
                "duration bounds must be positive".to_string(),
            ));
        }
        if self.upload_sample_rate == 0 {
            return Err(AnalysisError::Config(
                "upload_sample_rate must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upload_sample_rate, 22_050);
        assert_eq!(config.preview_max_seconds, 30.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "upload_max_seconds": 90.0, "extractor": { "n_mels": 64 } }"#)
                .unwrap();
        assert_eq!(config.upload_max_seconds, 90.0);
        assert_eq!(config.extractor.n_mels, 64);
        assert_eq!(config.extractor.fft_size, 2048);
    }

    #[test]
    fn test_rejects_bad_fft_size() {
        let mut config = AnalysisConfig::default();
        config.extractor.fft_size = 1000;
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AnalysisConfig::default();
        config.preview_max_seconds = 15.0;
        config.save(&path).unwrap();

        let loaded = AnalysisConfig::load(&path).unwrap();
        assert_eq!(loaded.preview_max_seconds, 15.0);
    }
}
