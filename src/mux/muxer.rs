use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::audio::buffer::AudioBuffer;
use crate::config::ReelConfig;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::mux::reconcile::{Reconciliation, reconcile};
use crate::mux::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::video::frame::{Frame, VideoStream};

/// Peak ceiling applied to the soundtrack before encoding.
pub const PEAK_CEILING: f32 = 1.0;

/// A finished reel on disk.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Artifact {
    /// Path of the encoded MP4.
    pub path: PathBuf,
    /// Number of frames handed to the sink.
    pub video_frames: usize,
    /// Number of mono samples handed to the sink.
    pub audio_samples: usize,
    /// Final duration in seconds (video-authoritative).
    pub duration_secs: f64,
    /// How the tracks were adjusted before encoding.
    pub reconciliation: Reconciliation,
}

/// Output file name for a job.
pub fn output_file_name(job_id: u64) -> String {
    format!("life_reel_{job_id}.mp4")
}

/// Combines one soundtrack and one frame stream into a single file.
#[derive(Clone, Debug)]
pub struct Muxer {
    tolerance: f64,
}

impl Muxer {
    /// Create a muxer that tolerates `tolerance` seconds of drift before truncating.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
        }
    }

    /// Build from [`ReelConfig::mux_tolerance`].
    pub fn from_config(config: &ReelConfig) -> Self {
        Self::new(config.mux_tolerance)
    }

    /// Drift tolerance in seconds.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Reconcile, normalize and stream both tracks into `sink`.
    ///
    /// The soundtrack is staged as a temporary `f32le` file next to `out_path` and removed
    /// afterwards, whether or not encoding succeeded. Every failure surfaces as
    /// [`ReelError::Mux`].
    #[tracing::instrument(skip_all, fields(out = %out_path.display()))]
    pub fn combine(
        &self,
        audio: &AudioBuffer,
        video: &VideoStream,
        sink: &mut dyn FrameSink,
        out_path: &Path,
    ) -> ReelResult<Artifact> {
        if audio.is_empty() {
            return Err(ReelError::mux("soundtrack is empty"));
        }
        if video.is_empty() {
            return Err(ReelError::mux("video stream has no frames"));
        }

        let (audio, video, reconciliation) = reconcile(audio, video, self.tolerance);
        if video.is_empty() {
            return Err(ReelError::mux(
                "soundtrack is shorter than a single frame; nothing to encode",
            ));
        }
        let audio = audio.peak_normalized(PEAK_CEILING);

        let mut audio_tmp = TempFileGuard(None);
        let audio_path = staging_path(out_path);
        audio
            .write_f32le(&audio_path)
            .map_err(|e| ReelError::mux(format!("stage soundtrack: {e}")))?;
        audio_tmp.0 = Some(audio_path.clone());

        let res = video.resolution();
        let cfg = SinkConfig {
            width: res.width,
            height: res.height,
            fps: video.fps(),
            audio: Some(AudioInputConfig {
                path: audio_path,
                sample_rate: audio.sample_rate(),
                channels: 1,
            }),
        };

        sink.begin(cfg).map_err(into_mux)?;
        // One buffer for every blended frame; stills are pushed from their shared decode.
        let mut scratch = Frame::solid(res, [0, 0, 0, 255]);
        for (i, entry) in video.entries().iter().enumerate() {
            let frame = entry.materialize(&mut scratch).map_err(into_mux)?;
            sink.push_frame(FrameIndex(i as u64), frame)
                .map_err(into_mux)?;
        }
        sink.end().map_err(into_mux)?;
        debug!(frames = video.len(), samples = audio.len(), "sink finished");

        let artifact = Artifact {
            path: out_path.to_path_buf(),
            video_frames: video.len(),
            audio_samples: audio.len(),
            duration_secs: video.duration_secs(),
            reconciliation,
        };
        info!(
            frames = artifact.video_frames,
            duration_secs = artifact.duration_secs,
            "reel encoded"
        );
        Ok(artifact)
    }
}

fn staging_path(out_path: &Path) -> PathBuf {
    let stem = out_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reel".to_owned());
    out_path.with_file_name(format!(".{stem}.{}.f32le", std::process::id()))
}

fn into_mux(err: ReelError) -> ReelError {
    match err {
        ReelError::Mux(_) => err,
        other => ReelError::mux(other.to_string()),
    }
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mux/muxer.rs"]
mod tests;
