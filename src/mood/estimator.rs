use serde::{Deserialize, Serialize};

use crate::audio::FeatureVector;
use crate::stats::{clamp01, round_to};

/// Brightness range mapped onto the valence axis (Hz)
pub const BRIGHTNESS_RANGE: (f64, f64) = (1000.0, 4000.0);
/// Tempo range mapped onto the valence axis (BPM)
pub const VALENCE_TEMPO_RANGE: (f64, f64) = (60.0, 180.0);
/// RMS range mapped onto the energy axis
pub const ENERGY_RMS_RANGE: (f64, f64) = (0.0, 0.5);
/// Tempo that scores highest for danceability (BPM)
pub const OPTIMAL_DANCE_TEMPO: f64 = 110.0;
/// Distance from the optimal tempo at which the tempo score reaches zero
pub const DANCE_TEMPO_FALLOFF: f64 = 100.0;

/// A position in (valence, energy, danceability) affect space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodPoint {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
}

impl MoodPoint {
    pub fn new(valence: f64, energy: f64, danceability: f64) -> Self {
        Self {
            valence,
            energy,
            danceability,
        }
    }

    /// Copy with each component rounded to 2 decimal places
    pub fn rounded(&self) -> Self {
        Self {
            valence: round_to(self.valence, 2),
            energy: round_to(self.energy, 2),
            danceability: round_to(self.danceability, 2),
        }
    }
}

/// Linear map of `value` from `[lo, hi]` onto `[0, 1]`, clamped.
///
/// A degenerate range (`hi == lo`) maps everything to 0.5.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return 0.5;
    }
    clamp01((value - lo) / (hi - lo))
}

/// 1.0 at the optimal dance tempo, falling linearly to 0 at 100 BPM either side
pub fn tempo_score(tempo: f64) -> f64 {
    (1.0 - (tempo - OPTIMAL_DANCE_TEMPO).abs() / DANCE_TEMPO_FALLOFF).max(0.0)
}

/// Brighter and faster reads as happier
pub fn valence(spectral_centroid: f64, tempo: f64) -> f64 {
    let brightness = normalize(spectral_centroid, BRIGHTNESS_RANGE.0, BRIGHTNESS_RANGE.1);
    let pace = normalize(tempo, VALENCE_TEMPO_RANGE.0, VALENCE_TEMPO_RANGE.1);
    clamp01(0.6 * brightness + 0.4 * pace)
}

pub fn energy(rms_energy: f64) -> f64 {
    normalize(rms_energy, ENERGY_RMS_RANGE.0, ENERGY_RMS_RANGE.1)
}

pub fn danceability(tempo: f64, energy: f64) -> f64 {
    clamp01(0.5 * tempo_score(tempo) + 0.5 * energy)
}

/// Map extracted features onto a [`MoodPoint`]. Total and side-effect free.
pub fn estimate(features: &FeatureVector) -> MoodPoint {
    let valence = valence(features.spectral_centroid, features.tempo);
    let energy = energy(features.rms_energy);
    let danceability = danceability(features.tempo, energy);

    MoodPoint::new(valence, energy, danceability)
}
