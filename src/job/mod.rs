//! Asynchronous reel jobs: records, storage, and the coordinator that runs them.

/// Submission and status payloads.
pub mod api;
/// Background job execution.
pub mod coordinator;
/// Job record and state machine.
pub mod model;
pub mod repository;
/// Reel requests and their validation.
pub mod request;
