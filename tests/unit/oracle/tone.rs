use super::*;

#[test]
fn renders_requested_length_at_its_rate() {
    let oracle = ToneOracle::new(8_000);
    let w = oracle.synthesize("calm ambient background music", 1.5, 0.75).unwrap();
    assert_eq!(w.sample_rate, 8_000);
    assert_eq!(w.samples.len(), 12_000);
    assert!(w.samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn output_is_deterministic() {
    let oracle = ToneOracle::new(8_000);
    let a = oracle.synthesize("sad", 0.25, 0.6).unwrap();
    let b = oracle.synthesize("sad", 0.25, 0.6).unwrap();
    assert_eq!(a, b);
}

#[test]
fn non_positive_duration_is_permanent_error() {
    let err = ToneOracle::default().synthesize("x", 0.0, 1.0).unwrap_err();
    assert!(!err.is_transient());
}

#[test]
fn shared_instance_is_reused() {
    let a = shared_tone_oracle();
    let b = shared_tone_oracle();
    assert!(Arc::ptr_eq(&a, &b));
}
