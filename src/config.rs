use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::core::{Fps, Resolution, SAMPLE_RATE};
use crate::foundation::error::{ReelError, ReelResult};
use crate::retry::RetryConfig;
use crate::video::compositor::DecodePolicy;

/// Backoff settings for oracle calls, in a serializable form.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles each attempt.
    pub base_delay_ms: u64,
    /// Backoff ceiling.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl RetrySettings {
    /// Build a [`RetryConfig`] for the named operation.
    pub fn to_retry_config(&self, operation: &str) -> RetryConfig {
        RetryConfig::new(operation)
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

/// Process configuration for the reel pipeline.
///
/// Sources, in order of precedence (last wins):
/// 1. [`ReelConfig::default`]
/// 2. a JSON file ([`ReelConfig::from_json_file`]), missing keys keep their defaults
/// 3. `LIFEREEL_*` environment variables ([`ReelConfig::apply_env`])
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Audio sample rate every oracle buffer must use.
    pub sample_rate: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Output resolution.
    pub resolution: Resolution,
    /// Seconds each image stays on screen, excluding transitions.
    pub duration_per_image: f64,
    /// Seconds of crossfade between consecutive images.
    pub transition_duration: f64,
    /// Seconds of overlap between consecutive music segments.
    pub audio_crossfade: f64,
    /// Allowed audio/video duration drift before the longer track is truncated.
    pub mux_tolerance: f64,
    /// Directory receiving `life_reel_<id>.mp4`.
    pub output_dir: PathBuf,
    /// Number of jobs executed at the same time.
    pub max_concurrent_jobs: usize,
    /// Per-call oracle timeout in seconds.
    pub oracle_timeout_secs: f64,
    /// Oracle retry policy.
    pub retry: RetrySettings,
    /// What to do when an image fails to decode.
    pub decode_policy: DecodePolicy,
    /// Worker thread count for frame blending (defaults to rayon's global pool).
    pub render_threads: Option<usize>,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            fps: Fps { num: 30, den: 1 },
            resolution: Resolution::default(),
            duration_per_image: 3.0,
            transition_duration: 1.0,
            audio_crossfade: 1.0,
            mux_tolerance: 0.1,
            output_dir: PathBuf::from("./output"),
            max_concurrent_jobs: 2,
            oracle_timeout_secs: 300.0,
            retry: RetrySettings::default(),
            decode_policy: DecodePolicy::Abort,
            render_threads: None,
        }
    }
}

impl ReelConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            ReelError::serde(format!("parse config '{}': {e}", path.display()))
        })
    }

    /// Apply `LIFEREEL_*` overrides from the process environment.
    pub fn apply_env(self) -> ReelResult<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (used by tests).
    pub fn apply_env_from(mut self, get: impl Fn(&str) -> Option<String>) -> ReelResult<Self> {
        fn parsed<T: std::str::FromStr>(
            get: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> ReelResult<Option<T>> {
            match get(key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<T>()
                    .map(Some)
                    .map_err(|_| ReelError::input(format!("{key}: cannot parse '{raw}'"))),
            }
        }

        if let Some(v) = parsed(&get, "LIFEREEL_SAMPLE_RATE")? {
            self.sample_rate = v;
        }
        if let Some(v) = parsed::<u32>(&get, "LIFEREEL_FPS")? {
            self.fps = Fps::integer(v)?;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_WIDTH")? {
            self.resolution.width = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_HEIGHT")? {
            self.resolution.height = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_DURATION_PER_IMAGE")? {
            self.duration_per_image = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_TRANSITION_DURATION")? {
            self.transition_duration = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_AUDIO_CROSSFADE")? {
            self.audio_crossfade = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_MUX_TOLERANCE")? {
            self.mux_tolerance = v;
        }
        if let Some(v) = get("LIFEREEL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = parsed(&get, "LIFEREEL_MAX_JOBS")? {
            self.max_concurrent_jobs = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_ORACLE_TIMEOUT_SECS")? {
            self.oracle_timeout_secs = v;
        }
        if let Some(v) = parsed(&get, "LIFEREEL_MAX_RETRIES")? {
            self.retry.max_retries = v;
        }
        if let Some(v) = get("LIFEREEL_DECODE_POLICY") {
            self.decode_policy = v.parse()?;
        }
        Ok(self)
    }

    /// Reject values the pipeline cannot honour.
    pub fn validate(&self) -> ReelResult<()> {
        if self.sample_rate == 0 {
            return Err(ReelError::input("sample_rate must be > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Resolution::new(self.resolution.width, self.resolution.height)?;
        if !(self.duration_per_image.is_finite() && self.duration_per_image > 0.0) {
            return Err(ReelError::input("duration_per_image must be > 0"));
        }
        for (name, v) in [
            ("transition_duration", self.transition_duration),
            ("audio_crossfade", self.audio_crossfade),
            ("mux_tolerance", self.mux_tolerance),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ReelError::input(format!("{name} must be finite and >= 0")));
            }
        }
        if self.max_concurrent_jobs == 0 {
            return Err(ReelError::input("max_concurrent_jobs must be >= 1"));
        }
        if !(self.oracle_timeout_secs.is_finite() && self.oracle_timeout_secs > 0.0) {
            return Err(ReelError::input("oracle_timeout_secs must be > 0"));
        }
        if self.render_threads == Some(0) {
            return Err(ReelError::input("render_threads must be >= 1 when set"));
        }
        Ok(())
    }

    /// Per-call oracle timeout.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.oracle_timeout_secs)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
