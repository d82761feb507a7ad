//! Orchestration of the single-track and playlist use cases.
//!
//! The two single-track paths deliberately differ in how they fail:
//! [`Pipeline::analyze_preview`] substitutes fallback features when decoding
//! or extraction fails, [`Pipeline::analyze_upload`] propagates the error.

pub mod source;
pub mod temp_file;

pub use source::{AudioSource, InMemoryAudio, LocalFileAudio};
pub use temp_file::TempAudioFile;

use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::audio::{AudioDecoder, FeatureExtractor};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::mood::{SongAnalysis, UploadMood, UploadMoodReport};
use crate::playlist::{self, PlaylistMoodResult, TrackFeatures, TrackMetadata};
use crate::stats::round_to;

pub struct Pipeline {
    config: AnalysisConfig,
    extractor: Arc<FeatureExtractor>,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let extractor = Arc::new(FeatureExtractor::new(config.extractor.clone()));
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Streaming-preview path: native rate, at most `preview_max_seconds`.
    ///
    /// Fetch and temp-file errors propagate. Decode and extraction errors do
    /// not: the fallback vector is analysed instead and `used_fallback` is set.
    pub async fn analyze_preview(&self, source: &dyn AudioSource) -> Result<SongAnalysis> {
        info!("Analyzing preview: {}", source.file_name());

        let bytes = source.fetch().await?;
        let temp = TempAudioFile::create(&self.config.temp_dir, source.file_name(), &bytes)?;

        let extractor = Arc::clone(&self.extractor);
        let max_seconds = self.config.preview_max_seconds;

        let (features, used_fallback) = tokio::task::spawn_blocking(move || {
            let decoded = AudioDecoder::decode_native(temp.path(), max_seconds);
            let result = extractor.extract_or_fallback(decoded);
            drop(temp);
            result
        })
        .await?;

        let analysis = SongAnalysis::from_features(features, used_fallback);
        info!(
            "{} (confidence {:.2}{})",
            analysis.message,
            analysis.mood.confidence,
            if used_fallback { ", fallback features" } else { "" }
        );
        Ok(analysis)
    }

    /// Upload path: resampled to `upload_sample_rate`, at most
    /// `upload_max_seconds`. Any decode or extraction failure is returned.
    pub async fn analyze_upload(&self, source: &dyn AudioSource) -> Result<UploadMoodReport> {
        let started = Instant::now();
        let file_name = source.file_name().to_string();
        info!("Analyzing upload: {}", file_name);

        let bytes = source.fetch().await?;
        let file_size_bytes = bytes.len() as u64;
        let temp = TempAudioFile::create(&self.config.temp_dir, &file_name, &bytes)?;
        drop(bytes);

        let extractor = Arc::clone(&self.extractor);
        let target_rate = self.config.upload_sample_rate;
        let max_seconds = self.config.upload_max_seconds;

        let outcome = tokio::task::spawn_blocking(move || {
            let result = AudioDecoder::decode_resampled(temp.path(), target_rate, max_seconds)
                .and_then(|buffer| extractor.extract(&buffer));
            drop(temp);
            result
        })
        .await
        .map_err(AnalysisError::from)
        .and_then(|result| result);

        let features = outcome.map_err(|e| {
            error!("Upload analysis failed for {}: {}", file_name, e);
            e
        })?;

        let report = UploadMoodReport {
            mood: UploadMood::from_features(&features),
            audio_features: features,
            processing_time_seconds: round_to(started.elapsed().as_secs_f64(), 3),
            file_size_bytes,
        };
        info!(
            "Upload {} analyzed as {} in {:.3}s",
            file_name, report.mood.primary_mood, report.processing_time_seconds
        );
        Ok(report)
    }

    /// Playlist path: pure aggregation over precomputed features.
    pub fn analyze_playlist(
        &self,
        features: &[Option<TrackFeatures>],
        metadata: Option<&HashMap<String, TrackMetadata>>,
    ) -> PlaylistMoodResult {
        let result = playlist::aggregate(features, metadata);
        info!(
            "Playlist of {} tracks: {} ({}, confidence {:.1})",
            result.track_count, result.primary_mood, result.mood_category, result.confidence
        );
        result
    }
}
