use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::debug;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::mux::sink::{FrameSink, SinkConfig};
use crate::video::frame::Frame;

/// Last lines of ffmpeg's stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Encodes a reel to MP4 through the system `ffmpeg`.
///
/// Frames go to ffmpeg's stdin as raw RGBA; the soundtrack is read from the `f32le` file named
/// in [`SinkConfig::audio`], which is required. An existing file at the output path is replaced.
pub struct FfmpegSink {
    out_path: PathBuf,
    encoder: Option<Encoder>,
    last_idx: Option<FrameIndex>,
}

struct Encoder {
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
    width: u32,
    height: u32,
}

impl FfmpegSink {
    /// Sink writing to `out_path`. Nothing is spawned until [`FrameSink::begin`].
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            encoder: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if self.encoder.is_some() {
            return Err(ReelError::mux("ffmpeg sink already started"));
        }
        let args = encoder_args(&cfg, &self.out_path)?;
        debug!(out = %self.out_path.display(), "spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ReelError::mux("ffmpeg is required for MP4 encoding, but was not found on PATH")
                }
                _ => ReelError::mux(format!("failed to spawn ffmpeg: {e}")),
            })?;

        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::mux("ffmpeg pipes were not opened"));
        };
        // ffmpeg blocks once its stderr pipe fills, so drain it concurrently.
        let stderr = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.encoder = Some(Encoder {
            child,
            stdin,
            stderr,
            width: cfg.width,
            height: cfg.height,
        });
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| ReelError::mux("ffmpeg sink not started"))?;
        if self.last_idx.is_some_and(|last| idx.0 <= last.0) {
            return Err(ReelError::mux(format!(
                "frame {} pushed out of order",
                idx.0
            )));
        }
        if frame.width != encoder.width || frame.height != encoder.height {
            return Err(ReelError::mux(format!(
                "frame {} is {}x{}, encoder expects {}x{}",
                idx.0, frame.width, frame.height, encoder.width, encoder.height
            )));
        }
        encoder
            .stdin
            .write_all(&frame.data)
            .map_err(|e| ReelError::mux(format!("ffmpeg stopped accepting frames: {e}")))?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        let Encoder {
            mut child,
            stdin,
            stderr,
            ..
        } = self
            .encoder
            .take()
            .ok_or_else(|| ReelError::mux("ffmpeg sink not started"))?;
        // Closing stdin is ffmpeg's end-of-stream.
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ReelError::mux(format!("failed to wait for ffmpeg: {e}")))?;
        let log = stderr
            .join()
            .map_err(|_| ReelError::mux("ffmpeg stderr reader panicked"))?
            .unwrap_or_default();
        if !status.success() {
            return Err(ReelError::mux(format!(
                "ffmpeg exited with {status}: {}",
                stderr_tail(&log)
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Some(mut encoder) = self.encoder.take() {
            let _ = encoder.child.kill();
            let _ = encoder.child.wait();
        }
    }
}

/// Command line for one reel encode: H.264 in yuv420p plus AAC, cut to the shorter input.
fn encoder_args(cfg: &SinkConfig, out_path: &Path) -> ReelResult<Vec<OsString>> {
    if cfg.fps.num == 0 || cfg.fps.den == 0 {
        return Err(ReelError::mux("fps must be non-zero"));
    }
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ReelError::mux("frame size must be non-zero"));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ReelError::mux(format!(
            "frame size {}x{} must be even for yuv420p",
            cfg.width, cfg.height
        )));
    }
    let audio = cfg
        .audio
        .as_ref()
        .ok_or_else(|| ReelError::mux("reel encoding needs a soundtrack"))?;
    if audio.sample_rate == 0 || audio.channels == 0 {
        return Err(ReelError::mux(
            "soundtrack sample rate and channel count must be non-zero",
        ));
    }

    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height).into());
    // `-r` before `-i` sets the rawvideo input rate.
    args.push("-r".into());
    args.push(format!("{}/{}", cfg.fps.num, cfg.fps.den).into());
    args.extend(["-i", "pipe:0", "-f", "f32le", "-ar"].map(OsString::from));
    args.push(audio.sample_rate.to_string().into());
    args.push("-ac".into());
    args.push(audio.channels.to_string().into());
    args.push("-i".into());
    args.push(audio.path.clone().into());
    args.extend(
        [
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
            "-movflags",
            "+faststart",
        ]
        .map(OsString::from),
    );
    args.push(out_path.into());
    Ok(args)
}

fn stderr_tail(log: &[u8]) -> String {
    let text = String::from_utf8_lossy(log);
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n")
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

#[cfg(test)]
#[path = "../../tests/unit/mux/ffmpeg.rs"]
mod tests;
