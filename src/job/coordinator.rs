use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use crate::audio::orchestrator::AudioOrchestrator;
use crate::config::ReelConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::api::{CreateJobResponse, JobStatusResponse};
use crate::job::model::{Job, JobError, JobId, Stage};
use crate::job::repository::{MemoryRepository, Repository};
use crate::job::request::ReelRequest;
use crate::mux::ffmpeg::FfmpegSink;
use crate::mux::muxer::{Artifact, Muxer, output_file_name};
use crate::mux::sink::FrameSink;
use crate::oracle::{EmotionOracle, MusicOracle};
use crate::video::compositor::{RenderOpts, VideoCompositor};

/// Creates the sink a job encodes into, given the job's output path.
pub type SinkFactory = Arc<dyn Fn(&Path) -> Box<dyn FrameSink> + Send + Sync>;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Sink factory producing [`FfmpegSink`]s.
pub fn ffmpeg_sink_factory() -> SinkFactory {
    Arc::new(|path: &Path| Box::new(FfmpegSink::new(path)) as Box<dyn FrameSink>)
}

/// Builder for [`JobCoordinator`].
pub struct CoordinatorBuilder {
    config: ReelConfig,
    music: Arc<dyn MusicOracle>,
    emotion: Option<Arc<dyn EmotionOracle>>,
    jobs: Option<Arc<dyn Repository<Job>>>,
    sink_factory: Option<SinkFactory>,
    audio: Option<AudioOrchestrator>,
}

impl CoordinatorBuilder {
    /// Analyse images submitted without an emotion.
    pub fn emotion_oracle(mut self, oracle: Arc<dyn EmotionOracle>) -> Self {
        self.emotion = Some(oracle);
        self
    }

    /// Store job records in `jobs` instead of memory.
    pub fn repository(mut self, jobs: Arc<dyn Repository<Job>>) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Encode through sinks from `factory` instead of ffmpeg.
    pub fn sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sink_factory = Some(factory);
        self
    }

    /// Use a preconfigured orchestrator (custom retry or timeout).
    pub fn audio_orchestrator(mut self, audio: AudioOrchestrator) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Validate the configuration and spawn the dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> ReelResult<JobCoordinator> {
        self.config.validate()?;
        let audio = self
            .audio
            .unwrap_or_else(|| AudioOrchestrator::new(Arc::clone(&self.music), &self.config));
        let inner = Arc::new(Inner {
            jobs: self
                .jobs
                .unwrap_or_else(|| Arc::new(MemoryRepository::<Job>::new()) as Arc<dyn Repository<Job>>),
            audio,
            compositor: VideoCompositor::new(RenderOpts::from_config(&self.config)),
            muxer: Muxer::from_config(&self.config),
            emotion: self.emotion,
            sink_factory: self.sink_factory.unwrap_or_else(ffmpeg_sink_factory),
            config: self.config,
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let workers = Arc::new(Semaphore::new(inner.config.max_concurrent_jobs));
        tokio::spawn(dispatch(Arc::clone(&inner), rx, workers));
        info!(
            max_concurrent_jobs = inner.config.max_concurrent_jobs,
            output_dir = %inner.config.output_dir.display(),
            "job coordinator started"
        );
        Ok(JobCoordinator { inner, queue: tx })
    }
}

struct QueuedJob {
    id: JobId,
    request: ReelRequest,
}

struct Inner {
    config: ReelConfig,
    jobs: Arc<dyn Repository<Job>>,
    audio: AudioOrchestrator,
    compositor: VideoCompositor,
    muxer: Muxer,
    emotion: Option<Arc<dyn EmotionOracle>>,
    sink_factory: SinkFactory,
}

/// Accepts reel requests and runs them on background workers.
///
/// Cloning shares the same queue and job store.
#[derive(Clone)]
pub struct JobCoordinator {
    inner: Arc<Inner>,
    queue: mpsc::UnboundedSender<QueuedJob>,
}

impl JobCoordinator {
    /// Start configuring a coordinator around a music oracle.
    pub fn builder(config: ReelConfig, music: Arc<dyn MusicOracle>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            config,
            music,
            emotion: None,
            jobs: None,
            sink_factory: None,
            audio: None,
        }
    }

    /// Validate `request`, record a Pending job and queue it.
    ///
    /// Returns immediately; the outcome is only observable through [`Self::status`].
    pub fn submit(&self, request: ReelRequest) -> ReelResult<CreateJobResponse> {
        request.validate()?;
        let job = self.inner.jobs.create(Job::pending(request.images.len()))?;
        let id = job.id;
        self.queue
            .send(QueuedJob { id, request })
            .map_err(|_| ReelError::job("job queue is closed"))?;
        info!(job_id = %id, images = job.total_images, "job accepted");
        Ok(CreateJobResponse::accepted(id))
    }

    /// Snapshot of job `id`.
    pub fn status(&self, id: JobId) -> ReelResult<JobStatusResponse> {
        Ok(JobStatusResponse::from(self.job(id)?.as_ref()))
    }

    /// Full record of job `id`.
    pub fn job(&self, id: JobId) -> ReelResult<Arc<Job>> {
        self.inner
            .jobs
            .get(id.0)?
            .ok_or_else(|| ReelError::job(format!("unknown job id {id}")))
    }

    /// Poll until job `id` is Completed or Failed.
    pub async fn wait_for_terminal(
        &self,
        id: JobId,
        timeout: Duration,
    ) -> ReelResult<JobStatusResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(id)?;
            if status.status.is_terminal() {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                return Err(ReelError::job(format!(
                    "job {id} still {} after {timeout:?}",
                    status.status
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

async fn dispatch(
    inner: Arc<Inner>,
    mut rx: mpsc::UnboundedReceiver<QueuedJob>,
    workers: Arc<Semaphore>,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = Arc::clone(&workers).acquire_owned().await else {
            break;
        };
        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            run_job(inner, job).await;
            drop(permit);
        });
    }
    debug!("job queue closed");
}

#[tracing::instrument(skip_all, fields(job_id = %job.id))]
async fn run_job(inner: Arc<Inner>, job: QueuedJob) {
    if let Err(e) = inner.jobs.replace(job.id.0, &|j: &Job| j.start()) {
        error!(error = %e, "cannot start job");
        return;
    }
    let started = Instant::now();
    info!("job processing");

    let outcome = execute(&inner, job.id, job.request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let stored = match outcome {
        Ok(artifact) => {
            info!(path = %artifact.path.display(), elapsed_ms, "job completed");
            inner
                .jobs
                .replace(job.id.0, &|j: &Job| j.complete(artifact.clone()))
        }
        Err(failure) => {
            warn!(stage = %failure.stage, error = %failure.message, elapsed_ms, "job failed");
            inner.jobs.replace(job.id.0, &|j: &Job| j.fail(failure.clone()))
        }
    };
    if let Err(e) = stored {
        error!(error = %e, "cannot record job outcome");
    }
}

async fn execute(inner: &Arc<Inner>, id: JobId, request: ReelRequest) -> Result<Artifact, JobError> {
    let request = Arc::new(request);

    let timeline = request
        .resolve_timeline_within(inner.emotion.clone(), inner.config.oracle_timeout())
        .await
        .map_err(|e| JobError::new(Stage::Timeline, e))?;
    debug!(segments = timeline.len(), "timeline ready");

    let audio_task = {
        let inner = Arc::clone(inner);
        tokio::spawn(async move { inner.audio.generate(&timeline).await })
    };
    let video_task = {
        let inner = Arc::clone(inner);
        let request = Arc::clone(&request);
        tokio::task::spawn_blocking(move || {
            inner.compositor.render(
                &request.paths(),
                request.duration_per_image,
                request.transition_duration,
            )
        })
    };
    let (audio, video) = tokio::join!(audio_task, video_task);
    let audio = stage_result(Stage::Audio, audio)?;
    let video = stage_result(Stage::Video, video)?;

    let out_path = inner.config.output_dir.join(output_file_name(id.0));
    let mux_task = {
        let inner = Arc::clone(inner);
        tokio::task::spawn_blocking(move || {
            let mut sink = (inner.sink_factory)(&out_path);
            inner
                .muxer
                .combine(&audio, &video, sink.as_mut(), &out_path)
        })
    };
    stage_result(Stage::Mux, mux_task.await)
}

fn stage_result<T>(
    stage: Stage,
    joined: Result<ReelResult<T>, tokio::task::JoinError>,
) -> Result<T, JobError> {
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(JobError::new(stage, e)),
        Err(join) if join.is_panic() => Err(JobError::new(stage, "stage panicked")),
        Err(join) => Err(JobError::new(stage, join)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/coordinator.rs"]
mod tests;
