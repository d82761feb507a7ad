//! The three mood labelling schemes.
//!
//! Each scheme has its own thresholds and is used in a different place:
//!
//! * [`classify`] labels a single analysed clip against five target points
//!   and reports a confidence in `[0, 1]`.
//! * [`classify_track_mood`] is the quick five-way label attached to
//!   representative tracks of a playlist.
//! * [`classify_playlist`] labels a playlist's mean (valence, energy) with a
//!   four-way split at 0.6.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::estimator::MoodPoint;
use crate::stats::{euclidean, round_to};

/// Distance at which single-track confidence reaches zero. An empirical
/// damping constant, not the largest possible distance.
pub const CONFIDENCE_DISTANCE_SCALE: f64 = 1.5;

/// Split used by the playlist-level quadrant scheme
pub const PLAYLIST_QUADRANT_SPLIT: f64 = 0.6;

/// Single-clip mood label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleTrackMood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Angry,
}

/// (mood, valence, energy) target for each single-clip label
pub const MOOD_TARGETS: [(SingleTrackMood, f64, f64); 5] = [
    (SingleTrackMood::Happy, 0.7, 0.7),
    (SingleTrackMood::Sad, 0.3, 0.3),
    (SingleTrackMood::Energetic, 0.6, 0.9),
    (SingleTrackMood::Calm, 0.5, 0.2),
    (SingleTrackMood::Angry, 0.3, 0.9),
];

impl SingleTrackMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            SingleTrackMood::Happy => "happy",
            SingleTrackMood::Sad => "sad",
            SingleTrackMood::Energetic => "energetic",
            SingleTrackMood::Calm => "calm",
            SingleTrackMood::Angry => "angry",
        }
    }

    /// (valence, energy) this label is centred on
    pub fn target(&self) -> (f64, f64) {
        MOOD_TARGETS
            .iter()
            .find(|(mood, _, _)| mood == self)
            .map(|&(_, valence, energy)| (valence, energy))
            .unwrap_or((0.5, 0.5))
    }
}

impl fmt::Display for SingleTrackMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labelled single clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodResult {
    pub primary_mood: SingleTrackMood,
    /// 0.0-1.0, rounded to 2 decimal places
    pub confidence: f64,
    #[serde(flatten)]
    pub mood_point: MoodPoint,
    pub reasoning: String,
}

/// Quadrant rule, evaluated in order of precedence
fn single_track_quadrant(valence: f64, energy: f64) -> SingleTrackMood {
    if valence > 0.6 && energy > 0.6 {
        SingleTrackMood::Happy
    } else if valence < 0.4 && energy < 0.4 {
        SingleTrackMood::Sad
    } else if valence < 0.4 && energy > 0.6 {
        SingleTrackMood::Angry
    } else if energy < 0.4 {
        SingleTrackMood::Calm
    } else {
        SingleTrackMood::Energetic
    }
}

/// `max(0, 1 - distance_to_target / 1.5)`
pub fn confidence(mood: SingleTrackMood, valence: f64, energy: f64) -> f64 {
    let (target_valence, target_energy) = mood.target();
    let distance = euclidean(&[valence, energy], &[target_valence, target_energy]);
    (1.0 - distance / CONFIDENCE_DISTANCE_SCALE).max(0.0)
}

/// Label a single clip and score how close it sits to its label's target.
pub fn classify(point: MoodPoint) -> MoodResult {
    let mood = single_track_quadrant(point.valence, point.energy);
    let confidence = round_to(confidence(mood, point.valence, point.energy), 2);

    MoodResult {
        primary_mood: mood,
        confidence,
        mood_point: point,
        reasoning: format!(
            "Valence {:.2} and energy {:.2} fall in the {} quadrant.",
            point.valence, point.energy, mood
        ),
    }
}

/// Quick five-way label for a playlist's representative tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackMoodLabel {
    #[serde(rename = "Happy & Energetic")]
    HappyEnergetic,
    #[serde(rename = "Happy & Calm")]
    HappyCalm,
    #[serde(rename = "Sad & Energetic")]
    SadEnergetic,
    #[serde(rename = "Sad & Calm")]
    SadCalm,
    Neutral,
}

impl TrackMoodLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackMoodLabel::HappyEnergetic => "Happy & Energetic",
            TrackMoodLabel::HappyCalm => "Happy & Calm",
            TrackMoodLabel::SadEnergetic => "Sad & Energetic",
            TrackMoodLabel::SadCalm => "Sad & Calm",
            TrackMoodLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for TrackMoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valence decides happy/sad (neutral in between), energy splits at 0.6
pub fn classify_track_mood(valence: f64, energy: f64) -> TrackMoodLabel {
    match (valence, energy) {
        (v, e) if v >= 0.6 && e >= 0.6 => TrackMoodLabel::HappyEnergetic,
        (v, _) if v >= 0.6 => TrackMoodLabel::HappyCalm,
        (v, e) if v < 0.4 && e >= 0.6 => TrackMoodLabel::SadEnergetic,
        (v, _) if v < 0.4 => TrackMoodLabel::SadCalm,
        _ => TrackMoodLabel::Neutral,
    }
}

/// Playlist-level label plus its short category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistMood {
    #[serde(rename = "Happy & Energetic")]
    HappyEnergetic,
    #[serde(rename = "Happy & Calm")]
    HappyCalm,
    #[serde(rename = "Intense & Dark")]
    IntenseDark,
    #[serde(rename = "Calm & Melancholic")]
    CalmMelancholic,
    /// No usable tracks
    Unknown,
}

impl PlaylistMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistMood::HappyEnergetic => "Happy & Energetic",
            PlaylistMood::HappyCalm => "Happy & Calm",
            PlaylistMood::IntenseDark => "Intense & Dark",
            PlaylistMood::CalmMelancholic => "Calm & Melancholic",
            PlaylistMood::Unknown => "Unknown",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            PlaylistMood::HappyEnergetic => "upbeat",
            PlaylistMood::HappyCalm => "peaceful",
            PlaylistMood::IntenseDark => "intense",
            PlaylistMood::CalmMelancholic => "calm",
            PlaylistMood::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlaylistMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-way split of a playlist's mean valence and energy at 0.6
pub fn classify_playlist(mean_valence: f64, mean_energy: f64) -> PlaylistMood {
    let bright = mean_valence > PLAYLIST_QUADRANT_SPLIT;
    let intense = mean_energy > PLAYLIST_QUADRANT_SPLIT;

    match (bright, intense) {
        (true, true) => PlaylistMood::HappyEnergetic,
        (true, false) => PlaylistMood::HappyCalm,
        (false, true) => PlaylistMood::IntenseDark,
        (false, false) => PlaylistMood::CalmMelancholic,
    }
}
