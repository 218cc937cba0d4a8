use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Immutable mono PCM track.
///
/// Samples live behind an `Arc`, so clones are cheap and never alias a mutable buffer.
/// Every transformation returns a new buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    samples: Arc<[f32]>,
}

impl AudioBuffer {
    /// Wrap `samples` recorded at `sample_rate`.
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::input("audio sample_rate must be non-zero"));
        }
        Ok(Self {
            sample_rate,
            samples: samples.into(),
        })
    }

    /// `len` samples of silence.
    pub fn silence(sample_rate: u32, len: usize) -> ReelResult<Self> {
        Self::new(sample_rate, vec![0.0; len])
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// First `len` samples (or the whole buffer when shorter).
    pub fn truncated_to(&self, len: usize) -> Self {
        if len >= self.samples.len() {
            return self.clone();
        }
        Self {
            sample_rate: self.sample_rate,
            samples: self.samples[..len].into(),
        }
    }

    /// Buffer extended with trailing silence to `len` samples (unchanged when already longer).
    pub fn padded_to(&self, len: usize) -> Self {
        if len <= self.samples.len() {
            return self.clone();
        }
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&self.samples);
        out.resize(len, 0.0);
        Self {
            sample_rate: self.sample_rate,
            samples: out.into(),
        }
    }

    /// Scale so the loudest sample sits at `ceiling`; quiet buffers are left alone.
    pub fn peak_normalized(&self, ceiling: f32) -> Self {
        let peak = self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak <= ceiling || peak == 0.0 || !peak.is_finite() {
            return self.clone();
        }
        let gain = ceiling / peak;
        Self {
            sample_rate: self.sample_rate,
            samples: self.samples.iter().map(|s| s * gain).collect(),
        }
    }

    /// Write samples as raw little-endian `f32` PCM.
    pub fn write_f32le(&self, out_path: &Path) -> ReelResult<()> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("create audio output directory '{}'", parent.display())
            })?;
        }

        let mut bytes = Vec::<u8>::with_capacity(self.samples.len() * 4);
        for &sample in self.samples.iter() {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        std::fs::write(out_path, bytes)
            .with_context(|| format!("write audio file '{}'", out_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/buffer.rs"]
mod tests;
