use tracing::debug;

use crate::audio::buffer::AudioBuffer;
use crate::foundation::core::secs_to_samples;
use crate::video::frame::VideoStream;

/// How [`reconcile`] adjusted the two tracks.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Reconciliation {
    /// Durations already agree to the sample.
    Unchanged,
    /// Audio cut down to the video's length.
    AudioTruncated {
        /// Audio length before the cut, in seconds.
        from_secs: f64,
        /// Audio length after the cut, in seconds.
        to_secs: f64,
    },
    /// Trailing frames dropped to match the audio.
    VideoTruncated {
        /// Frame count before the cut.
        from_frames: usize,
        /// Frame count after the cut.
        to_frames: usize,
    },
    /// Silence appended so the audio covers the video.
    AudioPadded {
        /// Seconds of silence added.
        added_secs: f64,
    },
}

/// Make the audio and video tracks duration-consistent.
///
/// - Drift above `tolerance`: the longer track is truncated to the shorter one.
/// - Drift within `tolerance`: the video is authoritative; audio is padded with silence or
///   trimmed to the video's exact length.
///
/// Frames are never fabricated.
pub fn reconcile(
    audio: &AudioBuffer,
    video: &VideoStream,
    tolerance: f64,
) -> (AudioBuffer, VideoStream, Reconciliation) {
    let audio_secs = audio.duration_secs();
    let video_secs = video.duration_secs();
    let drift = audio_secs - video_secs;
    let video_samples = secs_to_samples(video_secs, audio.sample_rate());

    let outcome = if drift.abs() > tolerance && drift < 0.0 {
        let keep = video.fps().secs_to_frames_floor(audio_secs) as usize;
        let cut = video.truncated_to(keep);
        // floor() can leave the audio a fraction of a frame longer than the cut video
        let audio = audio.truncated_to(secs_to_samples(cut.duration_secs(), audio.sample_rate()));
        let note = Reconciliation::VideoTruncated {
            from_frames: video.len(),
            to_frames: cut.len(),
        };
        (audio, cut, note)
    } else if audio.len() > video_samples {
        let trimmed = audio.truncated_to(video_samples);
        let note = Reconciliation::AudioTruncated {
            from_secs: audio_secs,
            to_secs: trimmed.duration_secs(),
        };
        (trimmed, video.clone(), note)
    } else if audio.len() < video_samples {
        let padded = audio.padded_to(video_samples);
        let note = Reconciliation::AudioPadded {
            added_secs: padded.duration_secs() - audio_secs,
        };
        (padded, video.clone(), note)
    } else {
        (audio.clone(), video.clone(), Reconciliation::Unchanged)
    };

    debug!(audio_secs, video_secs, tolerance, result = ?outcome.2, "reconciled tracks");
    outcome
}

#[cfg(test)]
#[path = "../../tests/unit/mux/reconcile.rs"]
mod tests;
