use super::*;
use crate::foundation::error::OracleErrorKind;
use crate::oracle::Waveform;
use crate::timeline::builder::{TimelineEntry, build_timeline};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

const RATE: u32 = 100;

/// Fails the first `fail_first` calls, then renders constant buffers.
struct Scripted {
    fail_first: u32,
    failure: OracleError,
    calls: AtomicU32,
    seen: Mutex<Vec<(String, f64, f32)>>,
    rate: u32,
}

impl Scripted {
    fn ok() -> Self {
        Self::failing(0, OracleError::transient("unused"))
    }

    fn failing(fail_first: u32, failure: OracleError) -> Self {
        Self {
            fail_first,
            failure,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
            rate: RATE,
        }
    }
}

impl MusicOracle for Scripted {
    fn synthesize(
        &self,
        prompt: &str,
        duration: f64,
        temperature: f32,
    ) -> Result<Waveform, OracleError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((prompt.to_string(), duration, temperature));
        if n < self.fail_first {
            return Err(self.failure.clone());
        }
        Ok(Waveform {
            sample_rate: self.rate,
            samples: vec![0.5; (duration * f64::from(self.rate)).round() as usize],
        })
    }
}

struct Empty;

impl MusicOracle for Empty {
    fn synthesize(&self, _: &str, _: f64, _: f32) -> Result<Waveform, OracleError> {
        Ok(Waveform {
            sample_rate: RATE,
            samples: Vec::new(),
        })
    }
}

struct Slow;

impl MusicOracle for Slow {
    fn synthesize(&self, _: &str, _: f64, _: f32) -> Result<Waveform, OracleError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(Waveform {
            sample_rate: RATE,
            samples: vec![0.0; 10],
        })
    }
}

fn config() -> ReelConfig {
    ReelConfig {
        sample_rate: RATE,
        audio_crossfade: 1.0,
        ..ReelConfig::default()
    }
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::new("test")
        .with_max_retries(max_retries)
        .with_base_delay(Duration::from_millis(1))
}

fn timeline(labels: &[(Emotion, f32)]) -> EmotionTimeline {
    let entries: Vec<_> = labels
        .iter()
        .map(|&(e, i)| TimelineEntry::new(e, i))
        .collect();
    build_timeline(&entries, 3.0, 1.0).unwrap()
}

#[test]
fn temperature_maps_intensity_into_range() {
    assert_eq!(temperature_for(0.0), 0.5);
    assert_eq!(temperature_for(1.0), 1.0);
    assert!((temperature_for(0.6) - 0.8).abs() < 1e-6);
    assert_eq!(temperature_for(5.0), 1.0);
    assert_eq!(temperature_for(-1.0), 0.5);
}

#[test]
fn every_emotion_has_a_prompt() {
    for e in Emotion::ALL {
        assert!(!prompt_for(e).is_empty());
    }
    assert_eq!(prompt_for(Emotion::Sad), "melancholic slow piano with soft strings");
}

#[tokio::test]
async fn stitches_three_segments_into_net_duration() {
    let oracle = Arc::new(Scripted::ok());
    let orch = AudioOrchestrator::new(oracle.clone(), &config());
    let tl = timeline(&[
        (Emotion::Happy, 0.8),
        (Emotion::Sad, 0.2),
        (Emotion::Happy, 0.8),
    ]);

    let track = orch.generate(&tl).await.unwrap();
    assert_eq!(track.len(), tl.expected_samples(RATE, 1.0));
    assert_eq!(track.len(), 700);

    let seen = oracle.seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1].0, prompt_for(Emotion::Sad));
    assert_eq!(seen[1].1, 3.0);
    assert!((seen[1].2 - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn single_segment_is_not_crossfaded() {
    let orch = AudioOrchestrator::new(Arc::new(Scripted::ok()), &config());
    let track = orch
        .generate(&timeline(&[(Emotion::Neutral, 0.5)]))
        .await
        .unwrap();
    assert_eq!(track.len(), 300);
    assert!(track.samples().iter().all(|&s| s == 0.5));
}

#[tokio::test]
async fn transient_failures_within_budget_recover() {
    let oracle = Arc::new(Scripted::failing(2, OracleError::transient("busy")));
    let orch = AudioOrchestrator::new(oracle.clone(), &config()).with_retry(fast_retry(3));
    let track = orch
        .generate(&timeline(&[(Emotion::Fear, 0.5)]))
        .await
        .unwrap();
    assert_eq!(track.len(), 300);
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_as_transient_oracle_error() {
    let oracle = Arc::new(Scripted::failing(10, OracleError::transient("busy")));
    let orch = AudioOrchestrator::new(oracle.clone(), &config()).with_retry(fast_retry(2));
    let err = orch
        .generate(&timeline(&[(Emotion::Fear, 0.5)]))
        .await
        .unwrap_err();
    match err {
        ReelError::Oracle(e) => {
            assert_eq!(e.kind, OracleErrorKind::Transient);
            assert!(e.message.contains("3 attempt"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let oracle = Arc::new(Scripted::failing(10, OracleError::permanent("bad prompt")));
    let orch = AudioOrchestrator::new(oracle.clone(), &config()).with_retry(fast_retry(3));
    assert!(
        orch.generate(&timeline(&[(Emotion::Angry, 0.5)]))
            .await
            .is_err()
    );
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_buffers_count_as_failures() {
    let orch = AudioOrchestrator::new(Arc::new(Empty), &config()).with_retry(fast_retry(1));
    let err = orch
        .generate(&timeline(&[(Emotion::Happy, 0.5)]))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_calls_time_out() {
    let orch = AudioOrchestrator::new(Arc::new(Slow), &config())
        .with_retry(fast_retry(0))
        .with_call_timeout(Duration::from_millis(20));
    let err = orch
        .generate(&timeline(&[(Emotion::Happy, 0.5)]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));
}

/// First call answers only after the caller has given up; later calls answer at once.
struct LateFirst {
    calls: AtomicU32,
}

impl MusicOracle for LateFirst {
    fn synthesize(&self, _: &str, duration: f64, _: f32) -> Result<Waveform, OracleError> {
        let late = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        if late {
            std::thread::sleep(Duration::from_millis(200));
        }
        Ok(Waveform {
            sample_rate: RATE,
            samples: vec![if late { 0.9 } else { 0.1 }; (duration * f64::from(RATE)) as usize],
        })
    }
}

#[tokio::test]
async fn late_results_of_timed_out_calls_are_discarded() {
    let oracle = Arc::new(LateFirst {
        calls: AtomicU32::new(0),
    });
    let orch = AudioOrchestrator::new(oracle.clone(), &config())
        .with_retry(fast_retry(2))
        .with_call_timeout(Duration::from_millis(50));
    let track = orch
        .generate(&timeline(&[(Emotion::Happy, 0.5)]))
        .await
        .unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    assert!(track.samples().iter().all(|&s| (s - 0.1).abs() < 1e-6));
}

#[tokio::test]
async fn foreign_sample_rate_is_rejected() {
    let mut oracle = Scripted::ok();
    oracle.rate = RATE * 2;
    let orch = AudioOrchestrator::new(Arc::new(oracle), &config());
    let err = orch
        .generate(&timeline(&[(Emotion::Happy, 0.5)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ReelError::Oracle(ref e) if !e.is_transient()));
}
