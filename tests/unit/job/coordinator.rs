use super::*;
use crate::foundation::error::OracleError;
use crate::job::model::JobStatus;
use crate::job::request::ReelImage;
use crate::mux::sink::InMemorySink;
use crate::oracle::Waveform;
use crate::timeline::emotion::Emotion;

struct Flat;

impl MusicOracle for Flat {
    fn synthesize(&self, _: &str, duration: f64, _: f32) -> Result<Waveform, OracleError> {
        Ok(Waveform {
            sample_rate: 100,
            samples: vec![0.2; (duration * 100.0).round() as usize],
        })
    }
}

fn config(dir: &Path) -> ReelConfig {
    ReelConfig {
        sample_rate: 100,
        fps: crate::foundation::core::Fps::integer(10).unwrap(),
        resolution: crate::foundation::core::Resolution::new(4, 4).unwrap(),
        output_dir: dir.to_path_buf(),
        ..ReelConfig::default()
    }
}

fn in_memory() -> SinkFactory {
    Arc::new(|_: &Path| Box::new(InMemorySink::new()) as Box<dyn FrameSink>)
}

#[tokio::test]
async fn invalid_requests_are_rejected_without_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = JobCoordinator::builder(config(dir.path()), Arc::new(Flat))
        .sink_factory(in_memory())
        .start()
        .unwrap();
    let err = coordinator
        .submit(ReelRequest {
            images: vec![],
            duration_per_image: 3.0,
            transition_duration: 1.0,
        })
        .unwrap_err();
    assert!(matches!(err, ReelError::Input(_)));
    assert!(matches!(coordinator.status(JobId(1)), Err(ReelError::Job(_))));
}

#[tokio::test]
async fn single_image_job_completes() {
    let dir = tempfile::tempdir().unwrap();
    let img = dir.path().join("a.png");
    image::RgbImage::from_pixel(4, 4, image::Rgb([9, 9, 9]))
        .save(&img)
        .unwrap();

    let coordinator = JobCoordinator::builder(config(dir.path()), Arc::new(Flat))
        .sink_factory(in_memory())
        .start()
        .unwrap();
    let accepted = coordinator
        .submit(ReelRequest {
            images: vec![ReelImage::new(&img).with_emotion(Emotion::Happy, None)],
            duration_per_image: 2.0,
            transition_duration: 1.0,
        })
        .unwrap();
    assert_eq!(accepted.status, "processing");

    let status = coordinator
        .wait_for_terminal(accepted.job_id, Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(status.status, JobStatus::Completed);
    assert_eq!(
        status.output_path,
        Some(dir.path().join(format!("life_reel_{}.mp4", accepted.job_id)))
    );
    let job = coordinator.job(accepted.job_id).unwrap();
    let artifact = job.artifact.as_ref().unwrap();
    assert_eq!(artifact.video_frames, 20);
    assert_eq!(artifact.audio_samples, 200);
}

#[test]
fn invalid_config_refuses_to_start() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let mut cfg = ReelConfig::default();
        cfg.max_concurrent_jobs = 0;
        assert!(JobCoordinator::builder(cfg, Arc::new(Flat)).start().is_err());
    });
}
