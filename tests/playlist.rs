//! Playlist aggregation through the JSON feature boundary.

use std::collections::HashMap;

use moodtune::playlist::{self, MoodDescriptor, TrackMetadata};
use moodtune::{AnalysisConfig, Pipeline};

fn pipeline() -> Pipeline {
    Pipeline::new(AnalysisConfig::default()).unwrap()
}

#[test]
fn mixed_playlist_is_calm_and_melancholic() {
    let mut entries = Vec::new();
    for i in 0..6 {
        entries.push(format!(r#"{{"id": "u{}", "valence": 0.65, "energy": 0.7, "danceability": 0.5, "tempo": 100}}"#, i));
    }
    for i in 0..4 {
        entries.push(format!(r#"{{"id": "d{}", "valence": 0.3, "energy": 0.3, "danceability": 0.5, "tempo": 100}}"#, i));
    }
    let json = format!("[{}]", entries.join(","));

    let features = playlist::parse_features(&json).unwrap();
    let result = pipeline().analyze_playlist(&features, None);

    assert_eq!(result.primary_mood, "Calm & Melancholic");
    assert_eq!(result.mood_category, "calm");
    assert_eq!(result.averages.valence, 0.51);
    assert_eq!(result.averages.energy, 0.54);
    assert_eq!(result.averages.tempo, 100.0);
    assert_eq!(result.mood_distribution.happy, 60.0);
    assert_eq!(result.mood_distribution.sad, 40.0);
    assert_eq!(result.mood_distribution.energetic, 60.0);
    assert_eq!(result.mood_distribution.calm, 40.0);
    assert_eq!(result.mood_distribution.danceable, 0.0);
    assert!(result.descriptors.is_empty());
    assert!(result.top_tracks.is_empty());
}

#[test]
fn null_entries_are_skipped() {
    let json = r#"[null, {"id": "a", "valence": 0.9, "energy": 0.9, "danceability": 0.8, "tempo": 140}, null]"#;
    let features = playlist::parse_features(json).unwrap();
    let result = pipeline().analyze_playlist(&features, None);

    assert_eq!(result.track_count, 1);
    assert_eq!(result.primary_mood, "Happy & Energetic");
    assert_eq!(result.mood_category, "upbeat");
    assert_eq!(
        result.descriptors,
        vec![MoodDescriptor::Danceable, MoodDescriptor::FastPaced]
    );
    assert!(result.confidence > 80.0);
}

#[test]
fn all_null_gives_unknown() {
    let features = playlist::parse_features("[null, null]").unwrap();
    let result = pipeline().analyze_playlist(&features, None);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["primaryMood"], "Unknown");
    assert_eq!(json["moodCategory"], "unknown");
    assert_eq!(json["trackCount"], 0);
    assert_eq!(json["confidence"], 0.0);
    assert_eq!(json["averages"]["tempo"], 0.0);
    assert_eq!(json["moodDistribution"]["happy"], 0.0);
    assert_eq!(json["topTracks"].as_array().unwrap().len(), 0);
}

#[test]
fn top_tracks_use_metadata() {
    let json = r#"[
        {"id": "calm", "valence": 0.45, "energy": 0.5},
        {"id": "bright", "valence": 0.95, "energy": 0.85},
        {"id": "dark", "valence": 0.1, "energy": 0.8},
        {"id": "mid", "valence": 0.6, "energy": 0.6},
        {"id": "low", "valence": 0.15, "energy": 0.1},
        {"id": "odd", "valence": 0.7, "energy": 0.2}
    ]"#;
    let metadata_json = r#"{
        "bright": {"name": "Sunrise", "artists": ["A", "B"]},
        "dark": {"name": "Storm", "artists": ["C"]}
    }"#;

    let features = playlist::parse_features(json).unwrap();
    let metadata: HashMap<String, TrackMetadata> = playlist::parse_metadata(metadata_json).unwrap();
    let result = pipeline().analyze_playlist(&features, Some(&metadata));

    assert_eq!(result.track_count, 6);
    assert_eq!(result.top_tracks.len(), 5);

    let ids: Vec<&str> = result.top_tracks.iter().map(|t| t.track_id.as_str()).collect();
    assert_eq!(ids, vec!["bright", "low", "dark", "odd", "mid"]);

    let bright = &result.top_tracks[0];
    assert_eq!(bright.track_name, "Sunrise");
    assert_eq!(bright.artists, vec!["A", "B"]);
    assert_eq!(bright.danceability, 0.5);

    let low = &result.top_tracks[1];
    assert_eq!(low.track_name, "Unknown Track");

    let labels: Vec<String> = result
        .top_tracks
        .iter()
        .map(|t| t.mood_label.to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["Happy & Energetic", "Sad & Calm", "Sad & Energetic", "Happy & Calm", "Happy & Energetic"]
    );

    let json = serde_json::to_value(&result).unwrap();
    let first = &json["topTracks"][0];
    assert_eq!(first["trackId"], "bright");
    assert_eq!(first["moodLabel"], "Happy & Energetic");
    assert!(first.get("score").is_none());
}

#[test]
fn malformed_record_is_rejected() {
    assert!(playlist::parse_features(r#"[{"id": "a", "energy": [1, 2]}]"#).is_err());
    assert!(playlist::parse_features("not json").is_err());
}
