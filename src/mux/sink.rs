use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::video::frame::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Raw PCM soundtrack to mux alongside the frames.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode sound.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (the soundtrack is mono).
    pub channels: u16,
}

/// Sink contract for consuming frames in display order.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ReelResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<FrameIndex>,
    audio_samples: Option<usize>,
    finished: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Indices of the received frames.
    pub fn frame_indices(&self) -> &[FrameIndex] {
        &self.frames
    }

    /// Mono sample count of the audio file seen in `begin`.
    pub fn audio_samples(&self) -> Option<usize> {
        self.audio_samples
    }

    /// `true` once `end` ran.
    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.audio_samples = match cfg.audio.as_ref() {
            Some(audio) => {
                let bytes = std::fs::metadata(&audio.path)
                    .map_err(|e| {
                        ReelError::mux(format!(
                            "audio input '{}' unreadable: {e}",
                            audio.path.display()
                        ))
                    })?
                    .len();
                Some((bytes / 4) as usize / usize::from(audio.channels.max(1)))
            }
            None => None,
        };
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &Frame) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::mux("in-memory sink not started"));
        }
        self.frames.push(idx);
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.finished = true;
        Ok(())
    }
}
