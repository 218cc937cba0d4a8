use super::*;
use crate::foundation::core::{Fps, Resolution};
use crate::mux::sink::AudioInputConfig;

fn cfg(width: u32, height: u32, audio: &Path) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::integer(10).unwrap(),
        audio: Some(AudioInputConfig {
            path: audio.to_path_buf(),
            sample_rate: 8000,
            channels: 1,
        }),
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn command_line_pairs_raw_frames_with_the_soundtrack() {
    let args = strings(&encoder_args(&cfg(16, 8, Path::new("s.f32le")), Path::new("out.mp4")).unwrap());
    let joined = args.join(" ");
    assert!(joined.starts_with("-y "));
    assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 16x8 -r 10/1 -i pipe:0"));
    assert!(joined.contains("-f f32le -ar 8000 -ac 1 -i s.f32le"));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p -c:a aac -shortest"));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}

#[test]
fn odd_sizes_and_missing_soundtrack_are_rejected_before_spawning() {
    let out = Path::new("out.mp4");
    let odd = encoder_args(&cfg(3, 2, Path::new("s.f32le")), out).unwrap_err();
    assert!(matches!(odd, ReelError::Mux(_)));

    let mut silent = cfg(4, 2, Path::new("s.f32le"));
    silent.audio = None;
    assert!(encoder_args(&silent, out).unwrap_err().to_string().contains("soundtrack"));

    let mut sink = FfmpegSink::new(out);
    assert!(sink.begin(cfg(3, 2, Path::new("s.f32le"))).is_err());
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new("unused.mp4");
    let frame = Frame::solid(Resolution::new(2, 2).unwrap(), [0, 0, 0, 255]);
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
}

#[test]
fn stderr_tail_keeps_the_last_lines() {
    let log: String = (0..30).map(|i| format!("line {i}\n")).collect();
    let tail = stderr_tail(log.as_bytes());
    assert!(tail.starts_with("line 10"));
    assert!(tail.ends_with("line 29"));
    assert_eq!(stderr_tail(b""), "");
}

#[test]
fn encodes_short_clip_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clip.mp4");
    let audio_path = dir.path().join("clip.f32le");
    let samples: Vec<u8> = (0..8000).flat_map(|_| 0.0f32.to_le_bytes()).collect();
    std::fs::write(&audio_path, samples).unwrap();
    std::fs::write(&out, b"stale").unwrap();

    let mut sink = FfmpegSink::new(&out);
    sink.begin(cfg(16, 16, &audio_path)).unwrap();
    let frame = Frame::solid(Resolution::new(16, 16).unwrap(), [200, 10, 10, 255]);
    for i in 0..10 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(FrameIndex(3), &frame).is_err());
    sink.end().unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 5);
}
