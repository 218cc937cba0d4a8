use super::*;
use crate::foundation::core::{Fps, Resolution};
use crate::video::frame::Frame;
use std::sync::Arc;

const RATE: u32 = 100;

fn video(frames: usize, fps: u32) -> VideoStream {
    let res = Resolution::new(2, 2).unwrap();
    let f = Arc::new(Frame::solid(res, [0, 0, 0, 255]));
    VideoStream::new(Fps::integer(fps).unwrap(), res, vec![f; frames]).unwrap()
}

fn audio(samples: usize) -> AudioBuffer {
    AudioBuffer::new(RATE, vec![0.25; samples]).unwrap()
}

#[test]
fn longer_audio_beyond_tolerance_is_truncated_to_video() {
    // 10.3 s of audio vs 10.0 s of video
    let (a, v, note) = reconcile(&audio(1030), &video(100, 10), 0.1);
    assert_eq!(a.len(), 1000);
    assert_eq!(v.len(), 100);
    assert!(matches!(note, Reconciliation::AudioTruncated { .. }));
    assert!((a.duration_secs() - 10.0).abs() < 1e-9);
}

#[test]
fn longer_video_beyond_tolerance_drops_trailing_frames() {
    // 7 s soundtrack vs 11 s slideshow (3 images, 3 s each, 1 s transitions at 30 fps)
    let (a, v, note) = reconcile(&audio(700), &video(330, 30), 0.1);
    assert_eq!(v.len(), 210);
    assert_eq!(a.len(), 700);
    assert_eq!(
        note,
        Reconciliation::VideoTruncated {
            from_frames: 330,
            to_frames: 210
        }
    );
}

#[test]
fn video_cut_never_outlasts_audio() {
    // 1.05 s of audio at 10 fps keeps 10 frames; audio trimmed to the cut
    let (a, v, _) = reconcile(&audio(105), &video(30, 10), 0.1);
    assert_eq!(v.len(), 10);
    assert_eq!(a.len(), 100);
}

#[test]
fn slightly_short_audio_is_padded_with_silence() {
    let (a, v, note) = reconcile(&audio(995), &video(100, 10), 0.1);
    assert_eq!(v.len(), 100);
    assert_eq!(a.len(), 1000);
    assert_eq!(a.samples()[994], 0.25);
    assert_eq!(a.samples()[999], 0.0);
    assert!(matches!(note, Reconciliation::AudioPadded { .. }));
}

#[test]
fn slightly_long_audio_is_trimmed_to_video() {
    let (a, _, note) = reconcile(&audio(1005), &video(100, 10), 0.1);
    assert_eq!(a.len(), 1000);
    assert!(matches!(note, Reconciliation::AudioTruncated { .. }));
}

#[test]
fn matching_tracks_are_unchanged() {
    let (a, v, note) = reconcile(&audio(1000), &video(100, 10), 0.1);
    assert_eq!(note, Reconciliation::Unchanged);
    assert_eq!((a.len(), v.len()), (1000, 100));
}
