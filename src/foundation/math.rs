/// Linear blend of two 8-bit channel values, `a*(1-alpha) + b*alpha`, rounded and saturated.
///
/// Operates on the stored (gamma-encoded) values directly.
pub(crate) fn lerp_u8(a: u8, b: u8, alpha: f32) -> u8 {
    let v = f32::from(a) * (1.0 - alpha) + f32::from(b) * alpha;
    v.round().clamp(0.0, 255.0) as u8
}

/// Linear blend of two samples with complementary ramp weights.
pub(crate) fn crossfade_sample(out_tail: f32, in_head: f32, fade_in: f32) -> f32 {
    out_tail * (1.0 - fade_in) + in_head * fade_in
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
