//! Soundtrack synthesis and stitching.

/// Immutable mono sample buffers.
pub mod buffer;
/// Per-segment synthesis with retries.
pub mod orchestrator;
/// Crossfade joins between segments.
pub mod stitch;
