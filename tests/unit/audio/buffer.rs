use super::*;

#[test]
fn zero_rate_is_rejected() {
    assert!(AudioBuffer::new(0, vec![0.0]).is_err());
}

#[test]
fn duration_follows_rate() {
    let buf = AudioBuffer::silence(32_000, 64_000).unwrap();
    assert_eq!(buf.len(), 64_000);
    assert!((buf.duration_secs() - 2.0).abs() < 1e-12);
}

#[test]
fn truncate_and_pad_return_new_buffers() {
    let buf = AudioBuffer::new(4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();

    let short = buf.truncated_to(2);
    assert_eq!(short.samples(), &[1.0, 2.0]);
    assert_eq!(buf.len(), 4);

    let long = buf.padded_to(6);
    assert_eq!(long.samples(), &[1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);

    assert_eq!(buf.truncated_to(10), buf);
    assert_eq!(buf.padded_to(1), buf);
}

#[test]
fn peak_normalize_only_attenuates_hot_buffers() {
    let hot = AudioBuffer::new(4, vec![0.5, -2.0, 1.0]).unwrap();
    let n = hot.peak_normalized(1.0);
    assert_eq!(n.samples(), &[0.25, -1.0, 0.5]);

    let quiet = AudioBuffer::new(4, vec![0.1, -0.2]).unwrap();
    assert_eq!(quiet.peak_normalized(1.0), quiet);
}

#[test]
fn f32le_file_has_four_bytes_per_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/audio.f32le");
    let buf = AudioBuffer::new(4, vec![0.25, -0.5, 1.0]).unwrap();
    buf.write_f32le(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[0..4], &0.25f32.to_le_bytes());
    assert_eq!(&bytes[8..12], &1.0f32.to_le_bytes());
}
