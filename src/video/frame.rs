use std::sync::Arc;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{ReelError, ReelResult};
use crate::video::blend::crossfade_into;

/// One opaque RGBA8 picture, tightly packed and row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap `data`, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(ReelError::render(format!(
                "frame data is {} bytes, expected {expected} for {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with one colour.
    pub fn solid(resolution: Resolution, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(resolution.rgba_len())
            .collect();
        Self {
            width: resolution.width,
            height: resolution.height,
            data,
        }
    }

    /// Dimensions as a [`Resolution`].
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

/// One position in a [`VideoStream`].
///
/// Transition frames stay lazy until a sink needs their pixels, so a stream only holds the
/// decoded stills however long it runs.
#[derive(Clone, Debug)]
pub enum StreamFrame {
    /// A decoded image shown as is.
    Still(Arc<Frame>),
    /// `from * (1 - alpha) + to * alpha`, blended on demand.
    Blend {
        /// Outgoing image.
        from: Arc<Frame>,
        /// Incoming image.
        to: Arc<Frame>,
        /// Weight of `to` in `[0, 1]`.
        alpha: f32,
    },
}

impl StreamFrame {
    /// Pixels of this position; blends are written into `scratch` and borrowed from it.
    pub fn materialize<'a>(&'a self, scratch: &'a mut Frame) -> ReelResult<&'a Frame> {
        match self {
            Self::Still(frame) => Ok(frame),
            Self::Blend { from, to, alpha } => {
                crossfade_into(from, to, *alpha, scratch)?;
                Ok(scratch)
            }
        }
    }

    fn matches(&self, resolution: Resolution) -> bool {
        match self {
            Self::Still(frame) => frame.resolution() == resolution,
            Self::Blend { from, to, .. } => {
                from.resolution() == resolution && to.resolution() == resolution
            }
        }
    }
}

impl From<Arc<Frame>> for StreamFrame {
    fn from(frame: Arc<Frame>) -> Self {
        Self::Still(frame)
    }
}

/// Ordered frames at a fixed rate and size.
///
/// Repeated static frames share one allocation and transitions are blended lazily.
#[derive(Clone, Debug)]
pub struct VideoStream {
    fps: Fps,
    resolution: Resolution,
    entries: Vec<StreamFrame>,
}

impl VideoStream {
    /// Assemble a stream of stills; every frame must match `resolution`.
    pub fn new(fps: Fps, resolution: Resolution, frames: Vec<Arc<Frame>>) -> ReelResult<Self> {
        Self::from_entries(
            fps,
            resolution,
            frames.into_iter().map(StreamFrame::from).collect(),
        )
    }

    /// Assemble a stream from stills and lazy blends.
    pub fn from_entries(
        fps: Fps,
        resolution: Resolution,
        entries: Vec<StreamFrame>,
    ) -> ReelResult<Self> {
        if let Some(i) = entries.iter().position(|e| !e.matches(resolution)) {
            return Err(ReelError::render(format!(
                "frame {i} does not match stream size {}x{}",
                resolution.width, resolution.height
            )));
        }
        Ok(Self {
            fps,
            resolution,
            entries,
        })
    }

    /// Frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Frame size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Positions in display order.
    pub fn entries(&self) -> &[StreamFrame] {
        &self.entries
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the stream has no frames.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.entries.len() as u64)
    }

    /// First `len` frames (or the whole stream when shorter).
    pub fn truncated_to(&self, len: usize) -> Self {
        Self {
            fps: self.fps,
            resolution: self.resolution,
            entries: self.entries.iter().take(len).cloned().collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/frame.rs"]
mod tests;
