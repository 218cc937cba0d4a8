use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::ReelConfig;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{ReelError, ReelResult};
use crate::video::blend::transition;
use crate::video::decode::load_image;
use crate::video::frame::{Frame, StreamFrame, VideoStream};

/// What the compositor does when an image cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Fail the whole render.
    #[default]
    Abort,
    /// Drop the image and keep going; fails only when nothing decodes.
    Skip,
}

impl FromStr for DecodePolicy {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(ReelError::input(format!("unknown decode policy '{other}'"))),
        }
    }
}

/// Output format and failure policy for [`VideoCompositor`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOpts {
    /// Output frame rate.
    pub fps: Fps,
    /// Output frame size.
    pub resolution: Resolution,
    /// Decode failure handling.
    pub decode_policy: DecodePolicy,
    /// Optional dedicated worker thread count.
    pub threads: Option<usize>,
}

impl RenderOpts {
    /// Options taken from the process config.
    pub fn from_config(config: &ReelConfig) -> Self {
        Self {
            fps: config.fps,
            resolution: config.resolution,
            decode_policy: config.decode_policy,
            threads: config.render_threads,
        }
    }
}

/// `n * round(d * fps) + (n - 1) * round(t * fps)`.
pub fn expected_frame_count(
    images: usize,
    duration_per_image: f64,
    transition_duration: f64,
    fps: Fps,
) -> u64 {
    if images == 0 {
        return 0;
    }
    let n = images as u64;
    n * fps.secs_to_frames_round(duration_per_image)
        + (n - 1) * fps.secs_to_frames_round(transition_duration)
}

/// Renders a slideshow: static blocks per image joined by crossfade transitions.
#[derive(Clone, Debug)]
pub struct VideoCompositor {
    opts: RenderOpts,
}

impl VideoCompositor {
    /// Create a compositor with `opts`.
    pub fn new(opts: RenderOpts) -> Self {
        Self { opts }
    }

    /// Render options in use.
    pub fn opts(&self) -> &RenderOpts {
        &self.opts
    }

    /// Decode `images` and lay them out as a frame sequence.
    ///
    /// Each image is held for `round(duration_per_image * fps)` frames; between consecutive
    /// images `round(transition_duration * fps)` blended frames are inserted.
    #[tracing::instrument(skip_all, fields(images = images.len()))]
    pub fn render(
        &self,
        images: &[PathBuf],
        duration_per_image: f64,
        transition_duration: f64,
    ) -> ReelResult<VideoStream> {
        if images.is_empty() {
            return Err(ReelError::input("no images to render"));
        }
        if !(duration_per_image.is_finite() && duration_per_image > 0.0) {
            return Err(ReelError::input("duration_per_image must be > 0"));
        }
        if !(transition_duration.is_finite() && transition_duration >= 0.0) {
            return Err(ReelError::input(
                "transition_duration must be finite and >= 0",
            ));
        }

        match self.opts.threads {
            Some(n) => build_thread_pool(n)?
                .install(|| self.render_inner(images, duration_per_image, transition_duration)),
            None => self.render_inner(images, duration_per_image, transition_duration),
        }
    }

    fn render_inner(
        &self,
        images: &[PathBuf],
        duration_per_image: f64,
        transition_duration: f64,
    ) -> ReelResult<VideoStream> {
        let started = Instant::now();
        let resolution = self.opts.resolution;
        let decoded: Vec<ReelResult<Frame>> = images
            .par_iter()
            .map(|path| load_image(path, resolution))
            .collect();

        let mut stills = Vec::with_capacity(decoded.len());
        for (index, result) in decoded.into_iter().enumerate() {
            match (result, self.opts.decode_policy) {
                (Ok(frame), _) => stills.push(Arc::new(frame)),
                (Err(e), DecodePolicy::Abort) => {
                    return Err(ReelError::render(format!("image {index}: {e}")));
                }
                (Err(e), DecodePolicy::Skip) => {
                    warn!(index, error = %e, "skipping undecodable image");
                }
            }
        }
        if stills.is_empty() {
            return Err(ReelError::render("none of the images could be decoded"));
        }

        let fps = self.opts.fps;
        let hold = fps.secs_to_frames_round(duration_per_image) as usize;
        let blend = fps.secs_to_frames_round(transition_duration) as usize;
        let total = expected_frame_count(stills.len(), duration_per_image, transition_duration, fps);

        let mut frames = Vec::with_capacity(total as usize);
        for (i, still) in stills.iter().enumerate() {
            frames.extend(std::iter::repeat_n(StreamFrame::Still(Arc::clone(still)), hold));
            if let Some(next) = stills.get(i + 1) {
                frames.extend(transition(still, next, blend)?);
            }
        }

        info!(
            stills = stills.len(),
            frames = frames.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "slideshow rendered"
        );
        VideoStream::from_entries(fps, resolution, frames)
    }
}

fn build_thread_pool(threads: usize) -> ReelResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(ReelError::input("render threads must be >= 1 when set"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| ReelError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/video/compositor.rs"]
mod tests;
