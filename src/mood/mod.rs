//! Mapping from extracted features to affect space and discrete mood labels.
//!
//! Everything here is a pure function over its inputs; the target-point table
//! is a constant.

pub mod classifier;
pub mod estimator;
pub mod report;

pub use classifier::{
    classify, classify_playlist, classify_track_mood, MoodResult, PlaylistMood,
    SingleTrackMood, TrackMoodLabel, MOOD_TARGETS,
};
pub use estimator::{estimate, normalize, tempo_score, MoodPoint};
pub use report::{MoodScores, SongAnalysis, UploadMood, UploadMoodReport};
