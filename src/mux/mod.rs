//! Track reconciliation and final encoding.

/// `ffmpeg` subprocess sink.
pub mod ffmpeg;
/// Audio/video combination into one artifact.
pub mod muxer;
/// Duration reconciliation between the two tracks.
pub mod reconcile;
/// Frame sink contract.
pub mod sink;
