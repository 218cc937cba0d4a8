//! Lifereel turns a curated photo set into a short music-backed video reel.
//!
//! A reel job runs four stages:
//!
//! - Build an [`EmotionTimeline`] from per-image emotions
//! - Synthesize one music segment per image and crossfade them ([`AudioOrchestrator`])
//! - Render the photos as a crossfaded slideshow ([`VideoCompositor`])
//! - Reconcile both tracks and encode them through a [`FrameSink`] ([`Muxer`])
//!
//! [`JobCoordinator`] runs jobs in the background and exposes their state for polling.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod audio;
pub mod catalog;
/// Process configuration.
pub mod config;
pub mod job;
pub mod mux;
pub mod oracle;
pub mod retry;
pub mod timeline;
pub mod video;

pub use crate::foundation::core::{Fps, FrameIndex, Resolution, SAMPLE_RATE, secs_to_samples};
pub use crate::foundation::error::{OracleError, OracleErrorKind, ReelError, ReelResult};

pub use crate::audio::buffer::AudioBuffer;
pub use crate::audio::orchestrator::{AudioOrchestrator, prompt_for, temperature_for};
pub use crate::audio::stitch::{crossfade_stitch, stitch_all};
pub use crate::catalog::{Annotators, Catalog};
pub use crate::config::{ReelConfig, RetrySettings};
pub use crate::job::api::{CreateJobResponse, JobStatusResponse};
pub use crate::job::coordinator::{CoordinatorBuilder, JobCoordinator, SinkFactory};
pub use crate::job::model::{Job, JobError, JobId, JobStatus, Stage};
pub use crate::job::repository::{
    ImageRecord, JsonFileRepository, MemoryRepository, Record, Repository, StyleModelRecord,
};
pub use crate::job::request::{ReelImage, ReelRequest};
pub use crate::mux::ffmpeg::FfmpegSink;
pub use crate::mux::muxer::{Artifact, Muxer};
pub use crate::mux::reconcile::{Reconciliation, reconcile};
pub use crate::mux::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::oracle::tone::{ToneOracle, shared_tone_oracle};
pub use crate::oracle::{EmotionAnalysis, EmotionOracle, MusicOracle, Waveform};
pub use crate::timeline::builder::{EmotionSegment, EmotionTimeline, TimelineEntry, build_timeline};
pub use crate::timeline::emotion::Emotion;
pub use crate::video::compositor::{DecodePolicy, RenderOpts, VideoCompositor};
pub use crate::video::frame::{Frame, StreamFrame, VideoStream};
