//! Audio mood analysis core.
//!
//! Single clips go through feature extraction ([`audio`]) and mood
//! estimation ([`mood`]); playlists of precomputed features go through the
//! aggregator ([`playlist`]). [`pipeline::Pipeline`] sequences both.

pub mod audio;
pub mod config;
pub mod error;
pub mod mood;
pub mod pipeline;
pub mod playlist;
pub mod stats;

pub use audio::{AudioBuffer, AudioDecoder, FeatureExtractor, FeatureVector};
pub use config::{AnalysisConfig, ExtractorConfig};
pub use error::{AnalysisError, Result};
pub use mood::{MoodPoint, MoodResult, SongAnalysis, UploadMoodReport};
pub use pipeline::{AudioSource, InMemoryAudio, LocalFileAudio, Pipeline};
pub use playlist::{PlaylistMoodResult, TrackFeatures, TrackMetadata};
