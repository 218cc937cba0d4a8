use crate::foundation::error::{ReelError, ReelResult};

/// Process-wide synthesis sample rate (mono), matching the music model's native output.
pub const SAMPLE_RATE: u32 = 32_000;

/// Absolute 0-based frame index in a rendered stream.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated rational frame rate.
    pub fn new(num: u32, den: u32) -> ReelResult<Self> {
        if den == 0 {
            return Err(ReelError::input("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ReelError::input("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate (`fps/1`).
    pub fn integer(fps: u32) -> ReelResult<Self> {
        Self::new(fps, 1)
    }

    /// Floating-point frames per second.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Duration covered by `frames` frames.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// `round(secs * fps)`, never negative.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }

    /// `floor(secs * fps)`, never negative.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

/// Output picture size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution; both sides must be non-zero and even (yuv420p output).
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::input("resolution width/height must be non-zero"));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ReelError::input(format!(
                "resolution {width}x{height} must be even (required for yuv420p output)"
            )));
        }
        Ok(Self { width, height })
    }

    /// Byte length of one RGBA8 frame at this resolution.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Convert seconds to a sample count at `sample_rate`, rounding to nearest.
pub fn secs_to_samples(secs: f64, sample_rate: u32) -> usize {
    (secs * f64::from(sample_rate)).round().max(0.0) as usize
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
