use std::path::Path;

use chrono::{DateTime, Utc};

use crate::foundation::error::{ReelError, ReelResult};
use crate::job::repository::Record;
use crate::mux::muxer::Artifact;

/// Monotonic job identifier. Allocation starts at 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`Job`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for a worker.
    #[default]
    Pending,
    /// A worker is running the pipeline.
    Processing,
    /// Artifact written.
    Completed,
    /// A stage failed; see [`Job::error`].
    Failed,
}

impl JobStatus {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed and Failed are terminal and never left again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    /// Emotion timeline construction.
    Timeline,
    /// Soundtrack synthesis.
    Audio,
    /// Slideshow rendering.
    Video,
    /// Reconciliation and encoding.
    Mux,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Timeline => "Timeline",
            Stage::Audio => "Audio",
            Stage::Video => "Video",
            Stage::Mux => "Mux",
        })
    }
}

/// Failure recorded on a [`Job`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobError {
    /// Stage that failed.
    pub stage: Stage,
    /// Human-readable cause.
    pub message: String,
}

impl JobError {
    /// Attribute `message` to `stage`.
    pub fn new(stage: Stage, message: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} stage failed: {}", self.stage, self.message)
    }
}

/// One reel generation request and its outcome.
///
/// Transitions return a new record; callers store it by replacement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Job {
    /// Assigned by the repository on create.
    pub id: JobId,
    /// Current state.
    pub status: JobStatus,
    /// Number of images in the request.
    pub total_images: usize,
    /// Set only on Completed.
    pub artifact: Option<Artifact>,
    /// Set only on Failed.
    pub error: Option<JobError>,
    /// Assigned by the repository on create.
    pub created_at: DateTime<Utc>,
    /// Set on either terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A fresh Pending job, not yet stored.
    pub fn pending(total_images: usize) -> Self {
        Self {
            id: JobId::default(),
            status: JobStatus::Pending,
            total_images,
            artifact: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Path of the finished reel.
    pub fn output_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(|a| a.path.as_path())
    }

    /// Pending → Processing.
    pub fn start(&self) -> ReelResult<Self> {
        self.expect_status(JobStatus::Pending, JobStatus::Processing)?;
        Ok(Self {
            status: JobStatus::Processing,
            ..self.clone()
        })
    }

    /// Processing → Completed.
    pub fn complete(&self, artifact: Artifact) -> ReelResult<Self> {
        self.expect_status(JobStatus::Processing, JobStatus::Completed)?;
        Ok(Self {
            status: JobStatus::Completed,
            artifact: Some(artifact),
            error: None,
            completed_at: Some(Utc::now()),
            ..self.clone()
        })
    }

    /// Processing → Failed.
    pub fn fail(&self, error: JobError) -> ReelResult<Self> {
        self.expect_status(JobStatus::Processing, JobStatus::Failed)?;
        Ok(Self {
            status: JobStatus::Failed,
            artifact: None,
            error: Some(error),
            completed_at: Some(Utc::now()),
            ..self.clone()
        })
    }

    fn expect_status(&self, from: JobStatus, to: JobStatus) -> ReelResult<()> {
        if self.status != from {
            return Err(ReelError::job(format!(
                "job {}: illegal transition {} -> {}",
                self.id, self.status, to
            )));
        }
        Ok(())
    }
}

impl Record for Job {
    const KIND: &'static str = "job";

    fn id(&self) -> u64 {
        self.id.0
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assign(&mut self, id: u64, created_at: DateTime<Utc>) {
        self.id = JobId(id);
        self.created_at = created_at;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/model.rs"]
mod tests;
