use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::buffer::AudioBuffer;
use crate::audio::stitch::stitch_all;
use crate::config::ReelConfig;
use crate::foundation::error::{OracleError, ReelError, ReelResult};
use crate::oracle::MusicOracle;
use crate::retry::{RetryConfig, retry_async};
use crate::timeline::builder::{EmotionSegment, EmotionTimeline};
use crate::timeline::emotion::Emotion;

/// Music prompt used for each emotion.
pub fn prompt_for(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "upbeat cheerful melody with bright piano and strings",
        Emotion::Sad => "melancholic slow piano with soft strings",
        Emotion::Angry => "intense dramatic orchestral music",
        Emotion::Fear => "suspenseful ambient music with low tones",
        Emotion::Surprise => "playful unexpected melody with bells",
        Emotion::Neutral => "calm ambient background music",
        Emotion::Disgust => "dissonant unsettling tones",
    }
}

/// Sampling temperature for an emotion intensity: `0.5 + intensity * 0.5` in `[0.5, 1.0]`.
pub fn temperature_for(intensity: f32) -> f32 {
    (0.5 + intensity * 0.5).clamp(0.5, 1.0)
}

/// Requests one waveform per timeline segment and stitches them into one track.
#[derive(Clone)]
pub struct AudioOrchestrator {
    oracle: Arc<dyn MusicOracle>,
    sample_rate: u32,
    crossfade_secs: f64,
    call_timeout: Duration,
    retry: RetryConfig,
}

impl AudioOrchestrator {
    /// Build an orchestrator around `oracle` using the rates and policies in `config`.
    pub fn new(oracle: Arc<dyn MusicOracle>, config: &ReelConfig) -> Self {
        Self {
            oracle,
            sample_rate: config.sample_rate,
            crossfade_secs: config.audio_crossfade,
            call_timeout: config.oracle_timeout(),
            retry: config.retry.to_retry_config("music_synthesis"),
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the per-call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Synthesize and stitch the soundtrack for `timeline`.
    ///
    /// Segments are requested in order. A segment whose oracle call keeps failing with a
    /// transient error past the retry budget, or fails permanently, aborts the whole track.
    #[tracing::instrument(skip_all, fields(segments = timeline.len()))]
    pub async fn generate(&self, timeline: &EmotionTimeline) -> ReelResult<AudioBuffer> {
        let started = Instant::now();
        let mut buffers = Vec::with_capacity(timeline.len());
        for (index, segment) in timeline.segments().iter().enumerate() {
            buffers.push(self.synthesize_segment(index, segment).await?);
        }

        let track = stitch_all(&buffers, self.crossfade_secs)?;
        info!(
            samples = track.len(),
            seconds = track.duration_secs(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "soundtrack stitched"
        );
        Ok(track)
    }

    async fn synthesize_segment(
        &self,
        index: usize,
        segment: &EmotionSegment,
    ) -> ReelResult<AudioBuffer> {
        let prompt = prompt_for(segment.emotion);
        let temperature = temperature_for(segment.intensity);
        let duration = segment.duration;
        debug!(
            index,
            emotion = %segment.emotion,
            duration,
            temperature,
            "requesting segment"
        );

        let waveform = retry_async(
            &self.retry,
            OracleError::is_transient,
            |_attempt| {
                let oracle = Arc::clone(&self.oracle);
                let call_timeout = self.call_timeout;
                async move {
                    let call = tokio::task::spawn_blocking(move || {
                        oracle.synthesize(prompt, duration, temperature)
                    });
                    match tokio::time::timeout(call_timeout, call).await {
                        Err(_) => {
                            // The blocking call cannot be cancelled; its late result is dropped.
                            warn!(
                                timeout_ms = call_timeout.as_millis() as u64,
                                "music synthesis timed out, abandoning the call"
                            );
                            Err(OracleError::transient(format!(
                                "music synthesis timed out after {call_timeout:?}"
                            )))
                        }
                        Ok(Err(join)) => Err(OracleError::permanent(format!(
                            "music synthesis task failed: {join}"
                        ))),
                        Ok(Ok(Err(e))) => Err(e),
                        Ok(Ok(Ok(w))) if w.samples.is_empty() => {
                            Err(OracleError::transient("music synthesis returned no samples"))
                        }
                        Ok(Ok(Ok(w))) => Ok(w),
                    }
                }
            },
        )
        .await
        .map_err(|exhausted| {
            ReelError::Oracle(OracleError {
                kind: exhausted.error.kind,
                message: format!(
                    "segment {index} ({}) failed after {} attempt(s): {}",
                    segment.emotion, exhausted.attempts, exhausted.error.message
                ),
            })
        })?;

        if waveform.sample_rate != self.sample_rate {
            return Err(ReelError::Oracle(OracleError::permanent(format!(
                "segment {index} returned {} Hz audio, expected {} Hz",
                waveform.sample_rate, self.sample_rate
            ))));
        }
        AudioBuffer::new(waveform.sample_rate, waveform.samples)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/orchestrator.rs"]
mod tests;
