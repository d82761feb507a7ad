/// Seconds of onset envelope considered by the tempo autocorrelation
const TEMPO_WINDOW_SECONDS: f32 = 8.0;
/// Width of the log-normal tempo prior, in octaves
const TEMPO_PRIOR_OCTAVES: f32 = 1.0;
/// Penalty on deviation from the estimated period between consecutive beats
const BEAT_TIGHTNESS: f32 = 100.0;

/// Tempo estimate plus the frames chosen as beats.
#[derive(Debug, Clone)]
pub struct BeatTrack {
    pub tempo: f32,
    pub beat_frames: Vec<usize>,
}

/// Onset-envelope tempo estimation and dynamic-programming beat tracking.
pub struct BeatDetector {
    frame_rate: f32,
    start_bpm: f32,
    max_bpm: f32,
}

impl BeatDetector {
    pub fn new(sample_rate: u32, hop_length: usize, start_bpm: f32, max_bpm: f32) -> Self {
        Self {
            frame_rate: sample_rate as f32 / hop_length as f32,
            start_bpm,
            max_bpm,
        }
    }

    /// Half-wave rectified frame-to-frame increase of a mel dB spectrogram,
    /// averaged over bands.
    pub fn onset_strength(mel_db: &[Vec<f32>]) -> Vec<f32> {
        let mut envelope = Vec::with_capacity(mel_db.len());
        if mel_db.is_empty() {
            return envelope;
        }

        envelope.push(0.0);
        for pair in mel_db.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            let bands = current.len().max(1);
            let rise: f32 = current
                .iter()
                .zip(previous.iter())
                .map(|(c, p)| (c - p).max(0.0))
                .sum();
            envelope.push(rise / bands as f32);
        }
        envelope
    }

    /// Dominant tempo in BPM; `start_bpm` when the envelope carries no rhythm.
    pub fn estimate_tempo(&self, onset: &[f32]) -> f32 {
        if onset.len() < 2 || onset.iter().all(|&x| x <= 0.0) {
            return self.start_bpm;
        }

        let max_lag = ((TEMPO_WINDOW_SECONDS * self.frame_rate).round() as usize).min(onset.len() - 1);
        let ac = autocorrelate(onset, max_lag);
        if ac[0] <= 0.0 {
            return self.start_bpm;
        }

        let log_start = self.start_bpm.log2();
        let mut best: Option<(f32, f32)> = None;

        for (lag, &value) in ac.iter().enumerate().skip(1) {
            let bpm = 60.0 * self.frame_rate / lag as f32;
            if bpm > self.max_bpm {
                continue;
            }

            let prior = -0.5 * ((bpm.log2() - log_start) / TEMPO_PRIOR_OCTAVES).powi(2);
            let score = (1.0 + 1e6 * value / ac[0]).ln() + prior;

            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, bpm));
            }
        }

        best.map(|(_, bpm)| bpm).unwrap_or(self.start_bpm)
    }

    /// Estimate tempo, then pick beats that line up with onsets while staying
    /// close to the tempo period.
    pub fn track(&self, onset: &[f32]) -> BeatTrack {
        let tempo = self.estimate_tempo(onset);
        let beat_frames = self.beat_frames(onset, tempo);

        log::debug!(
            "Beat tracking: {:.1} BPM, {} beats over {} frames",
            tempo,
            beat_frames.len(),
            onset.len()
        );

        BeatTrack { tempo, beat_frames }
    }

    fn beat_frames(&self, onset: &[f32], tempo: f32) -> Vec<usize> {
        let n = onset.len();
        if n == 0 || tempo <= 0.0 {
            return Vec::new();
        }

        let std = std_dev(onset);
        if std <= 0.0 {
            return Vec::new();
        }
        let normalized: Vec<f32> = onset.iter().map(|&x| x / std).collect();

        let period = ((60.0 * self.frame_rate / tempo).round() as usize).max(1);
        let local = local_score(&normalized, period);

        let max_local = local.iter().fold(0.0f32, |a, &b| a.max(b));
        let mut cumscore = vec![0.0f32; n];
        let mut backlink: Vec<Option<usize>> = vec![None; n];
        let mut started = false;

        for i in 0..n {
            let earliest = i.saturating_sub(2 * period);
            let latest = i.checked_sub((period / 2).max(1));

            let mut best: Option<(f32, usize)> = None;
            if let Some(latest) = latest {
                for prev in earliest..=latest {
                    let ratio = (i - prev) as f32 / period as f32;
                    let score = cumscore[prev] - BEAT_TIGHTNESS * ratio.ln().powi(2);
                    if best.map_or(true, |(s, _)| score > s) {
                        best = Some((score, prev));
                    }
                }
            }

            match best {
                Some((score, prev)) if started => {
                    cumscore[i] = local[i] + score;
                    backlink[i] = Some(prev);
                }
                _ => {
                    cumscore[i] = local[i];
                }
            }

            if !started && local[i] >= 0.01 * max_local && max_local > 0.0 {
                started = true;
            }
        }

        let mut beats = Vec::new();
        let mut cursor = last_beat(&cumscore);
        while let Some(frame) = cursor {
            beats.push(frame);
            cursor = backlink[frame];
        }
        beats.reverse();

        trim_weak_beats(beats, &local)
    }
}

fn autocorrelate(signal: &[f32], max_lag: usize) -> Vec<f32> {
    (0..=max_lag)
        .map(|lag| {
            signal[..signal.len() - lag]
                .iter()
                .zip(signal[lag..].iter())
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f32>() / (values.len() - 1) as f32;
    variance.sqrt()
}

/// Onset envelope smoothed by a Gaussian one period wide on each side
fn local_score(onset: &[f32], period: usize) -> Vec<f32> {
    let window: Vec<f32> = (0..=2 * period)
        .map(|j| {
            let offset = (j as f32 - period as f32) * 32.0 / period as f32;
            (-0.5 * offset * offset).exp()
        })
        .collect();

    (0..onset.len())
        .map(|i| {
            window
                .iter()
                .enumerate()
                .filter_map(|(j, &w)| {
                    let idx = i as isize + j as isize - period as isize;
                    if idx >= 0 && (idx as usize) < onset.len() {
                        Some(onset[idx as usize] * w)
                    } else {
                        None
                    }
                })
                .sum()
        })
        .collect()
}

/// Last local maximum of the cumulative score that is at least half the
/// median local-maximum score.
fn last_beat(cumscore: &[f32]) -> Option<usize> {
    let n = cumscore.len();
    if n == 0 {
        return None;
    }

    let is_max = |i: usize| {
        let left = i == 0 || cumscore[i] > cumscore[i - 1];
        let right = i + 1 == n || cumscore[i] >= cumscore[i + 1];
        left && right
    };

    let maxima: Vec<f32> = (0..n).filter(|&i| is_max(i)).map(|i| cumscore[i]).collect();
    if maxima.is_empty() {
        return None;
    }
    let median = crate::stats::median(&maxima) as f32;

    (0..n)
        .rev()
        .find(|&i| is_max(i) && cumscore[i] >= 0.5 * median)
}

/// Drop leading and trailing beats that sit on weak onsets
fn trim_weak_beats(beats: Vec<usize>, local: &[f32]) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }

    let energy = beats.iter().map(|&b| local[b] * local[b]).sum::<f32>() / beats.len() as f32;
    let threshold = 0.5 * energy.sqrt();

    let start = beats.iter().position(|&b| local[b] >= threshold);
    let end = beats.iter().rposition(|&b| local[b] >= threshold);

    match (start, end) {
        (Some(start), Some(end)) => beats[start..=end].to_vec(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Impulse envelope with one onset every `period` frames
    fn pulse_envelope(len: usize, period: usize, offset: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i >= offset && (i - offset) % period == 0 { 1.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_onset_strength_rectifies() {
        let mel_db = vec![vec![0.0, 0.0], vec![10.0, -10.0], vec![4.0, 2.0]];
        let onset = BeatDetector::onset_strength(&mel_db);
        assert_eq!(onset, vec![0.0, 5.0, 6.0]);
    }

    #[test]
    fn test_silence_falls_back_to_start_bpm() {
        let detector = BeatDetector::new(22_050, 512, 120.0, 320.0);
        let track = detector.track(&vec![0.0; 200]);
        assert_eq!(track.tempo, 120.0);
        assert!(track.beat_frames.is_empty());
    }

    #[test]
    fn test_tempo_from_periodic_pulses() {
        // 21 frames at 22050/512 fps is ~123 BPM
        let detector = BeatDetector::new(22_050, 512, 120.0, 320.0);
        let onset = pulse_envelope(400, 21, 5);
        let tempo = detector.estimate_tempo(&onset);
        assert!((tempo - 123.0).abs() < 1.0, "tempo was {}", tempo);
    }

    #[test]
    fn test_beats_follow_pulses() {
        let detector = BeatDetector::new(22_050, 512, 120.0, 320.0);
        let onset = pulse_envelope(400, 21, 5);
        let track = detector.track(&onset);

        assert!(track.beat_frames.len() >= 15, "beats: {:?}", track.beat_frames);
        for pair in track.beat_frames.windows(2) {
            assert_eq!(pair[1] - pair[0], 21, "beats: {:?}", track.beat_frames);
        }
        for &beat in &track.beat_frames {
            assert_eq!((beat - 5) % 21, 0);
        }
    }
}
