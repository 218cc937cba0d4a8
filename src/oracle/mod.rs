//! Black-box inference capabilities consumed by the pipeline.
//!
//! All oracles are blocking and `Send + Sync`; async callers run them on the blocking pool.

use std::collections::BTreeMap;

use image::DynamicImage;
use tracing::warn;

use crate::foundation::error::OracleError;
use crate::timeline::emotion::Emotion;

/// Built-in deterministic music synthesizer.
pub mod tone;

/// Mono waveform returned by a [`MusicOracle`].
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    /// Samples per second.
    pub sample_rate: u32,
    /// Mono samples in `[-1, 1]`.
    pub samples: Vec<f32>,
}

/// Text-conditioned music generation.
///
/// Calls run on the blocking pool under a per-call timeout. A call that overruns is not
/// interrupted: it keeps its thread until it returns, and whatever it returns is discarded.
/// A retry after a timeout therefore runs alongside the abandoned call.
pub trait MusicOracle: Send + Sync {
    /// Synthesize `duration` seconds of music for `prompt` at sampling `temperature`.
    fn synthesize(
        &self,
        prompt: &str,
        duration: f64,
        temperature: f32,
    ) -> Result<Waveform, OracleError>;
}

/// Output of an [`EmotionOracle`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmotionAnalysis {
    /// Dominant label.
    pub emotion: Emotion,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f32,
    /// Emotion strength in `[0, 1]`.
    pub intensity: f32,
    /// Score per label.
    #[serde(default)]
    pub scores: BTreeMap<Emotion, f32>,
}

impl EmotionAnalysis {
    /// Documented substitute for a failed analysis: neutral at 0.5 confidence and intensity.
    pub fn neutral_fallback() -> Self {
        Self {
            emotion: Emotion::Neutral,
            confidence: 0.5,
            intensity: 0.5,
            scores: BTreeMap::new(),
        }
    }
}

/// Facial-expression emotion classification.
///
/// Reel jobs bound each call the same way as [`MusicOracle`]; an overrun is abandoned and the
/// image is treated as neutral.
pub trait EmotionOracle: Send + Sync {
    /// Classify the dominant emotion of `image`.
    fn analyze(&self, image: &DynamicImage) -> Result<EmotionAnalysis, OracleError>;
}

/// Run `oracle`, substituting [`EmotionAnalysis::neutral_fallback`] on failure.
pub fn analyze_or_neutral(oracle: &dyn EmotionOracle, image: &DynamicImage) -> EmotionAnalysis {
    match oracle.analyze(image) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, "emotion analysis failed, using neutral fallback");
            EmotionAnalysis::neutral_fallback()
        }
    }
}

/// Image aesthetic quality scoring.
pub trait AestheticOracle: Send + Sync {
    /// Score in `[0, 1]`.
    fn score(&self, image: &DynamicImage) -> Result<f32, OracleError>;
}

/// One semantic tag with its relevance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tag {
    /// Tag text.
    pub label: String,
    /// Relevance in `[0, 1]`.
    pub relevance: f32,
}

/// Zero-shot semantic tagging.
pub trait TaggingOracle: Send + Sync {
    /// At most `k` tags, descending relevance.
    fn tags(&self, image: &DynamicImage, k: usize) -> Result<Vec<Tag>, OracleError>;
}

/// Opaque handle to a trained personal style model.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StyleModelHandle(pub String);

/// Prompted image generation with personal style fine-tuning.
pub trait ImageSynthesisOracle: Send + Sync {
    /// Generate an image for `prompt`.
    fn generate(&self, prompt: &str) -> Result<DynamicImage, OracleError>;

    /// Fine-tune on `samples` and return a handle to the trained weights.
    fn train(
        &self,
        samples: &[DynamicImage],
        prompt: &str,
        epochs: u32,
    ) -> Result<StyleModelHandle, OracleError>;
}

#[cfg(test)]
#[path = "../../tests/unit/oracle/fallback.rs"]
mod tests;
