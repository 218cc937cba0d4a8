use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::foundation::error::{ReelError, ReelResult};
use crate::oracle::{EmotionAnalysis, EmotionOracle, analyze_or_neutral};
use crate::timeline::builder::{EmotionTimeline, TimelineEntry, build_timeline};
use crate::timeline::emotion::Emotion;

/// One photo in a reel request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReelImage {
    /// Image file.
    pub path: PathBuf,
    /// Known emotion; analysed from the image when absent.
    #[serde(default)]
    pub emotion: Option<Emotion>,
    /// Known intensity in `[0, 1]`.
    #[serde(default)]
    pub intensity: Option<f32>,
}

impl ReelImage {
    /// An image whose emotion is left to analysis.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            emotion: None,
            intensity: None,
        }
    }

    /// Pin the emotion (and optionally the intensity).
    pub fn with_emotion(mut self, emotion: Emotion, intensity: Option<f32>) -> Self {
        self.emotion = Some(emotion);
        self.intensity = intensity;
        self
    }
}

/// A reel generation request.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReelRequest {
    /// Photos in display order.
    pub images: Vec<ReelImage>,
    /// Seconds each photo stays on screen.
    pub duration_per_image: f64,
    /// Seconds of crossfade between photos.
    pub transition_duration: f64,
}

impl ReelRequest {
    /// Reject requests that could never produce a timeline. No oracle is consulted.
    pub fn validate(&self) -> ReelResult<()> {
        let placeholder: Vec<_> = self
            .images
            .iter()
            .map(|img| TimelineEntry {
                emotion: img.emotion.unwrap_or(Emotion::Neutral),
                intensity: img.intensity,
            })
            .collect();
        build_timeline(
            &placeholder,
            self.duration_per_image,
            self.transition_duration,
        )
        .map(|_| ())
    }

    /// Image paths in display order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|img| img.path.clone()).collect()
    }

    /// Build the emotion timeline, analysing images without a pinned emotion.
    ///
    /// Blocking: may decode images and call `oracle`.
    pub fn resolve_timeline(
        &self,
        oracle: Option<&dyn EmotionOracle>,
    ) -> ReelResult<EmotionTimeline> {
        let entries = self
            .images
            .iter()
            .map(|img| resolve_entry(img, oracle))
            .collect::<Vec<_>>();
        build_timeline(&entries, self.duration_per_image, self.transition_duration)
    }

    /// [`Self::resolve_timeline`] with every analysis bounded by `per_call`.
    ///
    /// Analyses run on the blocking pool. One that overruns is abandoned (its late result is
    /// discarded) and the image gets the neutral fallback.
    pub async fn resolve_timeline_within(
        &self,
        oracle: Option<Arc<dyn EmotionOracle>>,
        per_call: Duration,
    ) -> ReelResult<EmotionTimeline> {
        let mut entries = Vec::with_capacity(self.images.len());
        for img in &self.images {
            let entry = match (&oracle, img.emotion) {
                (Some(oracle), None) => {
                    let oracle = Arc::clone(oracle);
                    let pending = img.clone();
                    let task = tokio::task::spawn_blocking(move || {
                        resolve_entry(&pending, Some(oracle.as_ref()))
                    });
                    match tokio::time::timeout(per_call, task).await {
                        Ok(Ok(entry)) => entry,
                        Ok(Err(e)) => {
                            warn!(path = %img.path.display(), error = %e, "emotion analysis panicked, using neutral fallback");
                            entry_from(img, Some(EmotionAnalysis::neutral_fallback()))
                        }
                        Err(_) => {
                            warn!(
                                path = %img.path.display(),
                                timeout_ms = per_call.as_millis() as u64,
                                "emotion analysis timed out, using neutral fallback"
                            );
                            entry_from(img, Some(EmotionAnalysis::neutral_fallback()))
                        }
                    }
                }
                _ => resolve_entry(img, oracle.as_deref()),
            };
            entries.push(entry);
        }
        build_timeline(&entries, self.duration_per_image, self.transition_duration)
    }
}

fn resolve_entry(img: &ReelImage, oracle: Option<&dyn EmotionOracle>) -> TimelineEntry {
    if let Some(emotion) = img.emotion {
        return TimelineEntry {
            emotion,
            intensity: img.intensity,
        };
    }
    let analysis = match oracle {
        Some(oracle) => match open_image(&img.path) {
            Ok(image) => Some(analyze_or_neutral(oracle, &image)),
            Err(e) => {
                // The video stage reports unreadable images under its decode policy.
                warn!(path = %img.path.display(), error = %e, "cannot analyse image, assuming neutral");
                None
            }
        },
        None => None,
    };
    entry_from(img, analysis)
}

fn entry_from(img: &ReelImage, analysis: Option<EmotionAnalysis>) -> TimelineEntry {
    match analysis {
        Some(a) => TimelineEntry {
            emotion: a.emotion,
            intensity: img.intensity.or(Some(a.intensity)),
        },
        None => TimelineEntry {
            emotion: Emotion::Neutral,
            intensity: img.intensity,
        },
    }
}

fn open_image(path: &Path) -> ReelResult<image::DynamicImage> {
    image::open(path).map_err(|e| ReelError::render(format!("decode '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/job/request.rs"]
mod tests;
