use tracing::debug;

use crate::foundation::core::secs_to_samples;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::emotion::Emotion;

/// Intensity assumed when the curated image carries none.
pub const DEFAULT_INTENSITY: f32 = 0.7;

/// One curated image's emotion as fed to the builder.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelineEntry {
    /// Dominant emotion.
    pub emotion: Emotion,
    /// Emotion strength in `[0, 1]`; `None` uses [`DEFAULT_INTENSITY`].
    #[serde(default)]
    pub intensity: Option<f32>,
}

impl TimelineEntry {
    /// Entry with an explicit intensity.
    pub fn new(emotion: Emotion, intensity: f32) -> Self {
        Self {
            emotion,
            intensity: Some(intensity),
        }
    }
}

/// One stretch of soundtrack conditioned on a single emotion.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmotionSegment {
    /// Emotion driving the music prompt.
    pub emotion: Emotion,
    /// Segment length in seconds, `> 0`.
    pub duration: f64,
    /// Emotion strength in `[0, 1]`.
    pub intensity: f32,
}

/// Ordered per-image emotion assignment.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmotionTimeline {
    segments: Vec<EmotionSegment>,
    transition_duration: f64,
}

impl EmotionTimeline {
    /// Segments in playback order.
    pub fn segments(&self) -> &[EmotionSegment] {
        &self.segments
    }

    /// Seconds of crossfade between consecutive images.
    pub fn transition_duration(&self) -> f64 {
        self.transition_duration
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false` for a built timeline.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment durations.
    pub fn nominal_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Length after each join removes up to `crossfade` seconds of overlap.
    ///
    /// Each overlap is bounded by the accumulated length so far and the next segment.
    pub fn net_duration(&self, crossfade: f64) -> f64 {
        let crossfade = crossfade.max(0.0);
        let mut iter = self.segments.iter();
        let Some(first) = iter.next() else {
            return 0.0;
        };
        iter.fold(first.duration, |acc, seg| {
            acc + seg.duration - crossfade.min(acc).min(seg.duration)
        })
    }

    /// Sample count of the stitched soundtrack, assuming every segment renders exactly.
    pub fn expected_samples(&self, sample_rate: u32, crossfade: f64) -> usize {
        let overlap = secs_to_samples(crossfade.max(0.0), sample_rate);
        let mut iter = self.segments.iter();
        let Some(first) = iter.next() else {
            return 0;
        };
        iter.fold(secs_to_samples(first.duration, sample_rate), |acc, seg| {
            let len = secs_to_samples(seg.duration, sample_rate);
            acc + len - overlap.min(acc).min(len)
        })
    }
}

/// Build an [`EmotionTimeline`] with one segment of `duration_per_image` per entry.
pub fn build_timeline(
    entries: &[TimelineEntry],
    duration_per_image: f64,
    transition_duration: f64,
) -> ReelResult<EmotionTimeline> {
    if entries.is_empty() {
        return Err(ReelError::input("timeline needs at least one image"));
    }
    if !(duration_per_image.is_finite() && duration_per_image > 0.0) {
        return Err(ReelError::input(format!(
            "duration_per_image must be > 0 (got {duration_per_image})"
        )));
    }
    if !(transition_duration.is_finite() && transition_duration >= 0.0) {
        return Err(ReelError::input(format!(
            "transition_duration must be finite and >= 0 (got {transition_duration})"
        )));
    }

    let segments = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let intensity = entry.intensity.unwrap_or(DEFAULT_INTENSITY);
            if !intensity.is_finite() {
                return Err(ReelError::input(format!(
                    "image {i}: intensity must be finite"
                )));
            }
            Ok(EmotionSegment {
                emotion: entry.emotion,
                duration: duration_per_image,
                intensity: intensity.clamp(0.0, 1.0),
            })
        })
        .collect::<ReelResult<Vec<_>>>()?;

    debug!(
        segments = segments.len(),
        duration_per_image, transition_duration, "built emotion timeline"
    );
    Ok(EmotionTimeline {
        segments,
        transition_duration,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
