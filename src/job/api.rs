use std::path::PathBuf;

use crate::job::model::{Job, JobError, JobId, JobStatus};

/// Reply to a job submission.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CreateJobResponse {
    /// Allocated id.
    pub job_id: JobId,
    /// Always `"processing"`.
    pub status: String,
}

impl CreateJobResponse {
    pub(crate) fn accepted(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Processing.as_str().to_owned(),
        }
    }
}

/// Reply to a status query.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobStatusResponse {
    /// Queried id.
    pub job_id: JobId,
    /// Current state.
    pub status: JobStatus,
    /// Finished reel, `null` unless Completed.
    pub output_path: Option<PathBuf>,
    /// Failure, `null` unless Failed.
    pub error: Option<JobError>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            output_path: job.output_path().map(PathBuf::from),
            error: job.error.clone(),
        }
    }
}
