use serde::{Deserialize, Serialize};

use super::classifier::{self, confidence, MoodResult, SingleTrackMood};
use super::estimator::{self, MoodPoint};
use crate::audio::FeatureVector;
use crate::stats::round_to;

pub const UPLOAD_REASONING: &str = "Derived from tempo, brightness, and energy patterns.";

/// Result of the streaming-preview path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAnalysis {
    pub mood: MoodResult,
    pub features: FeatureVector,
    /// Extraction failed and `features` holds the fallback vector
    pub used_fallback: bool,
    pub message: String,
}

impl SongAnalysis {
    /// Estimate and label a preview clip from its features.
    ///
    /// The mood point is rounded before labelling so the label always agrees
    /// with the reported numbers.
    pub fn from_features(features: FeatureVector, used_fallback: bool) -> Self {
        let point = estimator::estimate(&features).rounded();
        let mood = classifier::classify(point);
        let message = format!("Analysis complete: {} mood detected", mood.primary_mood);

        Self {
            mood,
            features,
            used_fallback,
            message,
        }
    }
}

/// Raw inputs and derived axes reported alongside an upload's mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodScores {
    pub valence: f64,
    pub energy: f64,
    pub tempo: f64,
    pub brightness: f64,
}

/// Mood of an uploaded file, with the scores that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMood {
    pub primary_mood: SingleTrackMood,
    pub mood_scores: MoodScores,
    pub confidence: f64,
    pub reasoning: String,
}

impl UploadMood {
    /// Brightness and tempo drive valence, normalised RMS drives energy;
    /// both go through the single-track quadrant rule unrounded.
    pub fn from_features(features: &FeatureVector) -> Self {
        let brightness = features.spectral_centroid;
        let tempo = features.tempo;
        let valence = estimator::valence(brightness, tempo);
        let energy = estimator::energy(features.rms_energy);

        let point = MoodPoint::new(valence, energy, estimator::danceability(tempo, energy));
        let primary_mood = classifier::classify(point).primary_mood;

        Self {
            primary_mood,
            mood_scores: MoodScores {
                valence: round_to(valence, 2),
                energy: round_to(energy, 2),
                tempo: round_to(tempo, 2),
                brightness: round_to(brightness, 2),
            },
            confidence: round_to(confidence(primary_mood, valence, energy), 2),
            reasoning: UPLOAD_REASONING.to_string(),
        }
    }
}

/// Full upload-path report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMoodReport {
    #[serde(flatten)]
    pub mood: UploadMood,
    pub audio_features: FeatureVector,
    pub processing_time_seconds: f64,
    pub file_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_preview_analysis() {
        let analysis = SongAnalysis::from_features(FeatureVector::fallback(), true);
        // (0.4, 0.2) is calm, 0.1 from the calm target
        assert_eq!(analysis.mood.primary_mood, SingleTrackMood::Calm);
        assert_eq!(analysis.mood.confidence, 0.93);
        assert_eq!(analysis.message, "Analysis complete: calm mood detected");
        assert!(analysis.used_fallback);
    }

    #[test]
    fn test_upload_mood_scores() {
        let mut features = FeatureVector::fallback();
        features.spectral_centroid = 3700.123;
        features.tempo = 150.0;
        features.rms_energy = 0.4;

        let mood = UploadMood::from_features(&features);
        assert_eq!(mood.primary_mood, SingleTrackMood::Happy);
        assert_eq!(mood.mood_scores.energy, 0.8);
        assert_eq!(mood.mood_scores.tempo, 150.0);
        assert_eq!(mood.mood_scores.brightness, 3700.12);
        assert_eq!(mood.reasoning, UPLOAD_REASONING);
        assert!(mood.confidence > 0.7 && mood.confidence <= 1.0);
    }

    #[test]
    fn test_upload_report_serializes_flat() {
        let features = FeatureVector::fallback();
        let report = UploadMoodReport {
            mood: UploadMood::from_features(&features),
            audio_features: features,
            processing_time_seconds: 1.25,
            file_size_bytes: 1024,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["primaryMood"].is_string());
        assert_eq!(json["moodScores"]["energy"], 0.2);
        assert_eq!(json["moodScores"]["brightness"], 2000.0);
        assert_eq!(json["audioFeatures"]["tempo"], 120.0);
        assert_eq!(json["fileSizeBytes"], 1024);
    }
}
