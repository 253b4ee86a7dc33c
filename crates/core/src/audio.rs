//! Decoded audio clip and normalization primitives

use rubato::{FftFixedIn, Resampler};

/// A fully decoded call recording.
///
/// Samples are f32 normalized to [-1.0, 1.0], interleaved when
/// multi-channel. This is a whole-call clip, not a streaming frame: the
/// pipeline consumes one recording per request.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved PCM samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (1 = mono)
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Frames per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Clip duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Downmix to mono by averaging all channels.
    ///
    /// Averaging rather than taking channel 0 keeps a speaker that the
    /// telephony stack confined to one channel audible in the mix.
    pub fn to_mono(&self) -> Self {
        if self.channels <= 1 {
            return self.clone();
        }

        let n = self.channels as usize;
        let mono: Vec<f32> = self
            .samples
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect();

        Self::new(mono, self.sample_rate, 1)
    }

    /// Resample to the target rate using Rubato's FFT resampler.
    ///
    /// Skipped entirely when already at the target rate. Falls back to
    /// linear interpolation for clips too short for the FFT chunking.
    /// Mono input is expected; call `to_mono` first.
    pub fn resample(&self, target_rate: u32) -> Self {
        if self.sample_rate == target_rate {
            return self.clone();
        }

        if self.samples.len() < 64 {
            return self.resample_linear(target_rate);
        }

        let samples_f64: Vec<f64> = self.samples.iter().map(|&s| s as f64).collect();
        let chunk_size = self.samples.len().min(1024);

        match FftFixedIn::<f64>::new(
            self.sample_rate as usize,
            target_rate as usize,
            chunk_size,
            2,
            1,
        ) {
            Ok(mut resampler) => {
                let mut out: Vec<f32> = Vec::with_capacity(
                    (self.samples.len() as f64 * target_rate as f64 / self.sample_rate as f64)
                        as usize
                        + chunk_size,
                );
                let mut pos = 0;
                while pos + chunk_size <= samples_f64.len() {
                    let input = vec![samples_f64[pos..pos + chunk_size].to_vec()];
                    match resampler.process(&input, None) {
                        Ok(output) => out.extend(output[0].iter().map(|&s| s as f32)),
                        Err(e) => {
                            tracing::warn!("Rubato processing failed, using linear fallback: {}", e);
                            return self.resample_linear(target_rate);
                        }
                    }
                    pos += chunk_size;
                }
                // Tail shorter than one chunk goes through the linear path
                if pos < samples_f64.len() {
                    let tail = Self::new(
                        self.samples[pos..].to_vec(),
                        self.sample_rate,
                        self.channels,
                    );
                    out.extend(tail.resample_linear(target_rate).samples);
                }
                Self::new(out, target_rate, self.channels)
            }
            Err(e) => {
                tracing::warn!("Rubato init failed, using linear fallback: {}", e);
                self.resample_linear(target_rate)
            }
        }
    }

    /// Linear interpolation fallback for edge cases
    fn resample_linear(&self, target_rate: u32) -> Self {
        let ratio = target_rate as f64 / self.sample_rate as f64;
        let new_len = (self.samples.len() as f64 * ratio) as usize;

        let mut resampled = Vec::with_capacity(new_len);
        for i in 0..new_len {
            let src_idx = i as f64 / ratio;
            let idx_floor = src_idx.floor() as usize;
            let idx_ceil = (idx_floor + 1).min(self.samples.len().saturating_sub(1));
            let frac = src_idx - idx_floor as f64;

            let sample = self.samples[idx_floor] * (1.0 - frac as f32)
                + self.samples[idx_ceil] * frac as f32;
            resampled.push(sample);
        }

        Self::new(resampled, target_rate, self.channels)
    }
}
