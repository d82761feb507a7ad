use log::debug;
use std::collections::HashMap;

use super::{
    Averages, MoodDescriptor, MoodDistribution, PlaylistMoodResult, TrackFeatures,
    TrackMetadata, TrackSummary,
};
use crate::mood::{classify_playlist, classify_track_mood, PlaylistMood};
use crate::stats::{euclidean, round_to};

/// Representative tracks returned at most
pub const TOP_TRACK_COUNT: usize = 5;
/// Confidence of a perfectly neutral playlist
pub const CONFIDENCE_FLOOR: f64 = 30.0;
/// Distance from the centre to a corner of the unit square
pub const MAX_CENTRE_DISTANCE: f64 = 0.70710678;

const HAPPY_VALENCE: f64 = 0.6;
const SAD_VALENCE: f64 = 0.4;
const ENERGETIC_ENERGY: f64 = 0.6;
const CALM_ENERGY: f64 = 0.4;
const DANCEABLE_DANCEABILITY: f64 = 0.6;

const NEUTRAL: f64 = 0.5;
const UNKNOWN_TRACK: &str = "Unknown Track";

/// Summarise a playlist's mood from per-track features.
///
/// `None` entries are dropped first. Never fails: an empty or all-`None`
/// input gives the canonical empty result. Representative tracks are only
/// selected when non-empty metadata is supplied.
pub fn aggregate(
    features: &[Option<TrackFeatures>],
    metadata: Option<&HashMap<String, TrackMetadata>>,
) -> PlaylistMoodResult {
    let valid: Vec<&TrackFeatures> = features.iter().flatten().collect();
    debug!(
        "Aggregating playlist mood over {} of {} feature entries",
        valid.len(),
        features.len()
    );

    if valid.is_empty() {
        return empty_result();
    }

    let averages = averages(&valid);
    let primary = classify_playlist(averages.valence, averages.energy);

    let top_tracks = match metadata {
        Some(metadata) if !metadata.is_empty() => select_top_tracks(&valid, metadata),
        _ => Vec::new(),
    };

    PlaylistMoodResult {
        primary_mood: primary.as_str().to_string(),
        mood_category: primary.category().to_string(),
        descriptors: descriptors(&averages),
        confidence: playlist_confidence(averages.valence, averages.energy),
        averages: Averages {
            valence: round_to(averages.valence, 3),
            energy: round_to(averages.energy, 3),
            danceability: round_to(averages.danceability, 3),
            tempo: round_to(averages.tempo, 2),
            acousticness: round_to(averages.acousticness, 3),
            instrumentalness: round_to(averages.instrumentalness, 3),
        },
        mood_distribution: mood_distribution(&valid),
        top_tracks,
        track_count: valid.len(),
    }
}

fn empty_result() -> PlaylistMoodResult {
    let unknown = PlaylistMood::Unknown;
    PlaylistMoodResult {
        primary_mood: unknown.as_str().to_string(),
        mood_category: unknown.category().to_string(),
        descriptors: Vec::new(),
        confidence: 0.0,
        averages: Averages::default(),
        mood_distribution: MoodDistribution::default(),
        top_tracks: Vec::new(),
        track_count: 0,
    }
}

/// Unrounded means; a missing field counts as 0 but stays in the denominator
fn averages(tracks: &[&TrackFeatures]) -> Averages {
    let n = tracks.len() as f64;
    let mean_of = |field: fn(&TrackFeatures) -> Option<f64>| {
        tracks.iter().map(|t| field(t).unwrap_or(0.0)).sum::<f64>() / n
    };

    Averages {
        valence: mean_of(|t| t.valence),
        energy: mean_of(|t| t.energy),
        danceability: mean_of(|t| t.danceability),
        tempo: mean_of(|t| t.tempo),
        acousticness: mean_of(|t| t.acousticness),
        instrumentalness: mean_of(|t| t.instrumentalness),
    }
}

fn descriptors(averages: &Averages) -> Vec<MoodDescriptor> {
    let mut tags = Vec::new();
    if averages.danceability > 0.7 {
        tags.push(MoodDescriptor::Danceable);
    }
    if averages.acousticness > 0.5 {
        tags.push(MoodDescriptor::Acoustic);
    }
    if averages.instrumentalness > 0.5 {
        tags.push(MoodDescriptor::Instrumental);
    }
    if averages.tempo > 120.0 {
        tags.push(MoodDescriptor::FastPaced);
    } else if averages.tempo < 90.0 {
        tags.push(MoodDescriptor::SlowPaced);
    }
    tags
}

/// Percentage of tracks meeting each category threshold, 1 decimal place
pub fn mood_distribution(tracks: &[&TrackFeatures]) -> MoodDistribution {
    if tracks.is_empty() {
        return MoodDistribution::default();
    }

    let percent = |matches: fn(&TrackFeatures) -> bool| {
        let count = tracks.iter().filter(|t| matches(t)).count();
        round_to(count as f64 / tracks.len() as f64 * 100.0, 1)
    };

    MoodDistribution {
        happy: percent(|t| t.valence.unwrap_or(0.0) >= HAPPY_VALENCE),
        sad: percent(|t| t.valence.unwrap_or(0.0) < SAD_VALENCE),
        energetic: percent(|t| t.energy.unwrap_or(0.0) >= ENERGETIC_ENERGY),
        calm: percent(|t| t.energy.unwrap_or(0.0) < CALM_ENERGY),
        danceable: percent(|t| t.danceability.unwrap_or(0.0) >= DANCEABLE_DANCEABILITY),
    }
}

/// `30 + 70 * distance_from_centre / sqrt(0.5)`, capped at 100, 1 decimal place
pub fn playlist_confidence(mean_valence: f64, mean_energy: f64) -> f64 {
    let distance = euclidean(&[mean_valence, mean_energy], &[NEUTRAL, NEUTRAL]);
    let confidence = CONFIDENCE_FLOOR + (distance / MAX_CENTRE_DISTANCE) * 70.0;
    round_to(confidence.min(100.0), 1)
}

/// The most mood-forward tracks: furthest from (0.5, 0.5) first.
///
/// Entries without an id are skipped. Missing axes read as neutral here.
/// The sort is stable, so equally scored tracks keep playlist order.
pub fn select_top_tracks(
    tracks: &[&TrackFeatures],
    metadata: &HashMap<String, TrackMetadata>,
) -> Vec<TrackSummary> {
    let mut scored: Vec<(f64, TrackSummary)> = tracks
        .iter()
        .filter_map(|track| {
            let id = track.id.as_deref().filter(|id| !id.is_empty())?;
            let valence = track.valence.unwrap_or(NEUTRAL);
            let energy = track.energy.unwrap_or(NEUTRAL);
            let danceability = track.danceability.unwrap_or(NEUTRAL);

            let score = euclidean(&[valence, energy], &[NEUTRAL, NEUTRAL]);
            let (name, artists) = match metadata.get(id) {
                Some(meta) => (meta.name.clone(), meta.artists.clone()),
                None => (UNKNOWN_TRACK.to_string(), Vec::new()),
            };

            let summary = TrackSummary {
                track_id: id.to_string(),
                track_name: name,
                artists,
                valence: round_to(valence, 3),
                energy: round_to(energy, 3),
                danceability: round_to(danceability, 3),
                mood_label: classify_track_mood(valence, energy),
            };
            Some((score, summary))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(TOP_TRACK_COUNT)
        .map(|(_, summary)| summary)
        .collect()
}
