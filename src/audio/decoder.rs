//! Decoding of arbitrary encoded audio (mp3/wav/flac/aac/...) into a mono
//! [`AudioBuffer`], plus the resampling step used by the upload path.

use log::{debug, info};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioBuffer;
use crate::error::{AnalysisError, Result};

pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode at the file's native rate, keeping at most `max_seconds`.
    ///
    /// Used by the streaming-preview path.
    pub fn decode_native<P: AsRef<Path>>(path: P, max_seconds: f32) -> Result<AudioBuffer> {
        Self::decode_file(path.as_ref(), Some(max_seconds))
    }

    /// Decode, truncate to `max_seconds` and resample to `target_rate`.
    ///
    /// Used by the upload path, which always analyses at a fixed rate.
    pub fn decode_resampled<P: AsRef<Path>>(
        path: P,
        target_rate: u32,
        max_seconds: f32,
    ) -> Result<AudioBuffer> {
        let buffer = Self::decode_file(path.as_ref(), Some(max_seconds))?;
        let resampled = resample(&buffer, target_rate)?;

        if resampled.is_empty() {
            return Err(AnalysisError::Decode(
                "resampling produced an empty signal".to_string(),
            ));
        }
        Ok(resampled)
    }

    fn decode_file(path: &Path, max_seconds: Option<f32>) -> Result<AudioBuffer> {
        info!("Decoding audio file: {}", path.display());

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // The extension is only a hint; the probe inspects the actual bytes
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AnalysisError::Decode(format!("unrecognised audio format: {}", e)))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AnalysisError::Decode("no audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        if sample_rate == 0 {
            return Err(AnalysisError::Decode("sample rate unknown".to_string()));
        }

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AnalysisError::Decode(format!("unsupported codec: {}", e)))?;

        let max_samples = max_seconds.map(|s| (s as f64 * sample_rate as f64) as usize);
        let mut samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(AnalysisError::Decode(format!("error reading packet: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(AnalysisError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count().max(1);

            let buf = sample_buf.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
            });
            if buf.capacity() < decoded.capacity() * channels {
                *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            }
            buf.copy_interleaved_ref(decoded);

            // Mix down to mono
            samples.extend(
                buf.samples()
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );

            if let Some(max) = max_samples {
                if samples.len() >= max {
                    samples.truncate(max);
                    break;
                }
            }
        }

        if samples.is_empty() {
            return Err(AnalysisError::Decode("decoded signal is empty".to_string()));
        }

        let buffer = AudioBuffer::new(samples, sample_rate);
        info!(
            "Decoded {} samples at {}Hz ({:.2}s)",
            buffer.len(),
            sample_rate,
            buffer.duration_seconds()
        );
        Ok(buffer)
    }
}

/// Sinc resampling of a mono buffer to `target_rate`.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer> {
    if buffer.sample_rate == target_rate || buffer.is_empty() {
        return Ok(AudioBuffer::new(buffer.samples.clone(), target_rate));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = target_rate as f64 / buffer.sample_rate as f64;

    // Whole buffer in a single chunk
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, buffer.len(), 1)
        .map_err(|e| AnalysisError::Analysis(format!("failed to create resampler: {}", e)))?;

    let input = vec![buffer.samples.clone()];
    let mut output = resampler
        .process(&input, None)
        .map_err(|e| AnalysisError::Analysis(format!("resampling failed: {}", e)))?;

    let samples = output.pop().unwrap_or_default();
    debug!(
        "Resampled {} samples ({}Hz) -> {} samples ({}Hz)",
        buffer.len(),
        buffer.sample_rate,
        samples.len(),
        target_rate
    );

    Ok(AudioBuffer::new(samples, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sine_wav(path: &Path, sample_rate: u32, channels: u16, seconds: f32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let frames = (sample_rate as f32 * seconds) as usize;
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 44_100, 2, 1.0);

        let buffer = AudioDecoder::decode_native(&path, 30.0).unwrap();
        assert_eq!(buffer.sample_rate, 44_100);
        assert_eq!(buffer.len(), 44_100);

        let peak = buffer.samples.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(peak > 0.45 && peak < 0.55, "peak was {}", peak);
    }

    #[test]
    fn test_decode_truncates_to_max_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.wav");
        write_sine_wav(&path, 8_000, 1, 3.0);

        let buffer = AudioDecoder::decode_native(&path, 1.5).unwrap();
        assert_eq!(buffer.len(), 12_000);
    }

    #[test]
    fn test_decode_resampled_to_target_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_sine_wav(&path, 44_100, 1, 1.0);

        let buffer = AudioDecoder::decode_resampled(&path, 22_050, 600.0).unwrap();
        assert_eq!(buffer.sample_rate, 22_050);
        let expected = 22_050i64;
        assert!(
            (buffer.len() as i64 - expected).abs() < 400,
            "unexpected length {}",
            buffer.len()
        );
    }

    #[test]
    fn test_garbage_bytes_fail_with_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp3");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0x13u8; 4096]).unwrap();

        let result = AudioDecoder::decode_native(&path, 30.0);
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let buffer = AudioBuffer::new(vec![0.1, 0.2, 0.3], 22_050);
        let out = resample(&buffer, 22_050).unwrap();
        assert_eq!(out.samples, buffer.samples);
    }
}
