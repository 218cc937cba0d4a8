//! Slideshow rendering.

/// Crossfade pixel blending.
pub mod blend;
/// Slideshow layout and rendering.
pub mod compositor;
/// Image decoding and resizing.
pub mod decode;
/// Frames and frame streams.
pub mod frame;
