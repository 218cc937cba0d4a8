use super::*;
use crate::foundation::core::Resolution;

fn solid(rgba: [u8; 4]) -> Frame {
    Frame::solid(Resolution::new(4, 2).unwrap(), rgba)
}

#[test]
fn alpha_endpoints_reproduce_inputs() {
    let a = solid([0, 0, 0, 255]);
    let b = solid([200, 100, 50, 255]);
    assert_eq!(crossfade(&a, &b, 0.0).unwrap(), a);
    assert_eq!(crossfade(&a, &b, 1.0).unwrap(), b);
}

#[test]
fn midpoint_blends_encoded_values() {
    let a = solid([0, 0, 0, 255]);
    let b = solid([255, 100, 51, 255]);
    let mid = crossfade(&a, &b, 0.5).unwrap();
    assert_eq!(&mid.data[0..4], &[128, 50, 26, 255]);
}

#[test]
fn size_mismatch_is_render_error() {
    let a = solid([0, 0, 0, 255]);
    let b = Frame::solid(Resolution::new(2, 2).unwrap(), [0, 0, 0, 255]);
    assert!(matches!(crossfade(&a, &b, 0.5), Err(ReelError::Render(_))));
}

#[test]
fn crossfade_into_reuses_and_resizes_the_buffer() {
    let a = solid([0, 0, 0, 255]);
    let b = solid([100, 100, 100, 255]);
    let mut out = Frame::solid(Resolution::new(2, 2).unwrap(), [9; 4]);
    crossfade_into(&a, &b, 0.5, &mut out).unwrap();
    assert_eq!(out, crossfade(&a, &b, 0.5).unwrap());

    let odd = Frame::solid(Resolution::new(2, 2).unwrap(), [0; 4]);
    assert!(matches!(
        crossfade_into(&a, &odd, 0.5, &mut out),
        Err(ReelError::Render(_))
    ));
}

#[test]
fn transition_starts_at_first_image_and_ramps() {
    let a = Arc::new(solid([0, 0, 0, 255]));
    let b = Arc::new(solid([100, 100, 100, 255]));
    let steps = transition(&a, &b, 4).unwrap();
    assert_eq!(steps.len(), 4);
    assert!(matches!(&steps[0], StreamFrame::Still(f) if Arc::ptr_eq(f, &a)));

    let mut scratch = solid([0; 4]);
    let reds: Vec<u8> = steps
        .iter()
        .map(|s| s.materialize(&mut scratch).unwrap().data[0])
        .collect();
    assert_eq!(reds, vec![0, 25, 50, 75]);
}

#[test]
fn zero_count_transition_is_empty() {
    let a = Arc::new(solid([0, 0, 0, 255]));
    assert!(transition(&a, &a, 0).unwrap().is_empty());
}

#[test]
fn transition_rejects_mismatched_images() {
    let a = Arc::new(solid([0, 0, 0, 255]));
    let b = Arc::new(Frame::solid(Resolution::new(2, 2).unwrap(), [0; 4]));
    assert!(matches!(transition(&a, &b, 3), Err(ReelError::Render(_))));
}
