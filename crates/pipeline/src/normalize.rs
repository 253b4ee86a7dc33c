//! Audio normalization
//!
//! Converts an uploaded recording into the canonical format the downstream
//! models require: mono, 16-bit WAV at the configured sample rate. The
//! normalized artifact is a request-scoped temp file deleted on drop, so
//! cleanup happens on every exit path including downstream failures.

use call_qa_core::{AnalysisError, AudioClip, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempPath;

/// The canonical normalized recording: a transient mono WAV on disk
#[derive(Debug)]
pub struct NormalizedAudio {
    path: TempPath,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

impl NormalizedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Converts arbitrary uploaded audio into the canonical format
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    target_sample_rate: u32,
}

impl AudioNormalizer {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Normalize uploaded bytes to a transient canonical WAV.
    ///
    /// Fails with `UnsupportedFormat` when the input is not a RIFF/WAV
    /// container and `CorruptAudio` when the container is recognized but
    /// undecodable. Resampling is skipped when the source already sits at
    /// the target rate.
    pub fn normalize(&self, bytes: &[u8]) -> Result<NormalizedAudio> {
        let clip = self.decode(bytes)?;

        let mono = clip.to_mono();
        let canonical = if mono.sample_rate == self.target_sample_rate {
            mono
        } else {
            tracing::debug!(
                from = mono.sample_rate,
                to = self.target_sample_rate,
                "Resampling uploaded audio"
            );
            mono.resample(self.target_sample_rate)
        };

        debug_assert_eq!(canonical.channels, 1);
        self.write_artifact(&canonical)
    }

    /// Decode the upload to an f32 PCM clip
    fn decode(&self, bytes: &[u8]) -> Result<AudioClip> {
        // The corpus audio stack decodes WAV; anything else is rejected at
        // this boundary rather than guessed at.
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(AnalysisError::UnsupportedFormat(
                "expected a RIFF/WAV container".to_string(),
            ));
        }

        let reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(AnalysisError::CorruptAudio(format!(
                "invalid WAV header: {} channels at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?,
            (SampleFormat::Int, bits) if bits <= 32 => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?
            }
            (format, bits) => {
                return Err(AnalysisError::UnsupportedFormat(format!(
                    "unsupported WAV encoding: {:?} at {} bits",
                    format, bits
                )))
            }
        };

        if samples.is_empty() {
            return Err(AnalysisError::CorruptAudio(
                "WAV container holds no samples".to_string(),
            ));
        }

        Ok(AudioClip::new(samples, spec.sample_rate, spec.channels))
    }

    /// Write the canonical clip to a transient 16-bit mono WAV
    fn write_artifact(&self, clip: &AudioClip) -> Result<NormalizedAudio> {
        let file = tempfile::Builder::new()
            .prefix("callqa-")
            .suffix(".wav")
            .tempfile()?;

        let spec = WavSpec {
            channels: 1,
            sample_rate: clip.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::new(file.as_file(), spec)
            .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?;
        for &sample in &clip.samples {
            let pcm16 = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer
                .write_sample(pcm16)
                .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| AnalysisError::CorruptAudio(e.to_string()))?;

        Ok(NormalizedAudio {
            path: file.into_temp_path(),
            sample_rate: clip.sample_rate,
            duration_secs: clip.duration_secs(),
        })
    }
}
