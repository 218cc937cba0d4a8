//! Emotion timeline construction.

/// Timeline segments and the builder.
pub mod builder;
/// Emotion labels.
pub mod emotion;
