//! Playlist-level mood aggregation over precomputed per-track features.

pub mod aggregator;

pub use aggregator::{
    aggregate, mood_distribution, playlist_confidence, select_top_tracks, TOP_TRACK_COUNT,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::mood::TrackMoodLabel;

/// One track's features as supplied by an external provider.
///
/// Every field may be absent; how a gap is filled depends on where the value
/// is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub valence: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub danceability: Option<f64>,
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub acousticness: Option<f64>,
    #[serde(default)]
    pub instrumentalness: Option<f64>,
}

impl TrackFeatures {
    pub fn new(id: &str, valence: f64, energy: f64, danceability: f64) -> Self {
        Self {
            id: Some(id.to_string()),
            valence: Some(valence),
            energy: Some(energy),
            danceability: Some(danceability),
            ..Default::default()
        }
    }
}

/// Display metadata for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

/// Percentage of tracks in each (overlapping) category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoodDistribution {
    pub happy: f64,
    pub sad: f64,
    pub energetic: f64,
    pub calm: f64,
    pub danceable: f64,
}

/// Independent tags describing a playlist's averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoodDescriptor {
    Danceable,
    Acoustic,
    Instrumental,
    FastPaced,
    SlowPaced,
}

/// Display projection of a representative track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub track_id: String,
    pub track_name: String,
    pub artists: Vec<String>,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub mood_label: TrackMoodLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistMoodResult {
    pub primary_mood: String,
    pub mood_category: String,
    #[serde(alias = "moodDescriptors")]
    pub descriptors: Vec<MoodDescriptor>,
    /// 0-100
    pub confidence: f64,
    pub averages: Averages,
    pub mood_distribution: MoodDistribution,
    pub top_tracks: Vec<TrackSummary>,
    pub track_count: usize,
}

/// Parse a JSON array of feature records; `null` entries are kept as `None`.
///
/// Non-numeric values in numeric fields are rejected rather than defaulted.
pub fn parse_features(json: &str) -> Result<Vec<Option<TrackFeatures>>> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a JSON object mapping track id to `{name, artists}`
pub fn parse_metadata(json: &str) -> Result<HashMap<String, TrackMetadata>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_features<P: AsRef<Path>>(path: P) -> Result<Vec<Option<TrackFeatures>>> {
    let json = std::fs::read_to_string(path)?;
    parse_features(&json)
}

pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<HashMap<String, TrackMetadata>> {
    let json = std::fs::read_to_string(path)?;
    parse_metadata(&json)
}
