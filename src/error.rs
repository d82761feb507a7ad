//! Error types for the mood analysis core.

use thiserror::Error;

/// Failures surfaced by the single-track paths and the feature-record boundary.
///
/// Playlist aggregation itself never produces one of these: degenerate input
/// yields the canonical empty result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The buffer could not be decoded into a non-empty mono signal at a
    /// positive sample rate.
    #[error("Failed to decode audio: {0}")]
    Decode(String),

    /// Decoding succeeded but a feature pass could not complete.
    #[error("Audio analysis failed: {0}")]
    Analysis(String),

    /// A per-track feature record did not match the expected shape.
    #[error("Invalid feature record: {0}")]
    InvalidFeatures(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The blocking extraction task panicked or was aborted.
    #[error("Analysis worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
