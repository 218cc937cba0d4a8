use crate::audio::buffer::AudioBuffer;
use crate::foundation::core::secs_to_samples;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::crossfade_sample;

/// Join `a` and `b` with a linear crossfade of `crossfade_secs`.
///
/// The overlap is `min(crossfade * rate, len(a), len(b))`. Within it, `a` ramps out as
/// `1 - i/overlap` while `b` ramps in as `i/overlap`; a zero overlap is plain concatenation.
/// Both inputs are left untouched.
pub fn crossfade_stitch(
    a: &AudioBuffer,
    b: &AudioBuffer,
    crossfade_secs: f64,
) -> ReelResult<AudioBuffer> {
    if a.sample_rate() != b.sample_rate() {
        return Err(ReelError::input(format!(
            "cannot stitch buffers with different sample rates ({} Hz vs {} Hz)",
            a.sample_rate(),
            b.sample_rate()
        )));
    }

    let a_s = a.samples();
    let b_s = b.samples();
    let overlap = secs_to_samples(crossfade_secs.max(0.0), a.sample_rate())
        .min(a_s.len())
        .min(b_s.len());

    let mut out = Vec::with_capacity(a_s.len() + b_s.len() - overlap);
    let split = a_s.len() - overlap;
    out.extend_from_slice(&a_s[..split]);
    if overlap > 0 {
        let n = overlap as f32;
        out.extend(
            a_s[split..]
                .iter()
                .zip(&b_s[..overlap])
                .enumerate()
                .map(|(i, (&tail, &head))| crossfade_sample(tail, head, i as f32 / n)),
        );
    }
    out.extend_from_slice(&b_s[overlap..]);

    AudioBuffer::new(a.sample_rate(), out)
}

/// Fold [`crossfade_stitch`] left-to-right over `segments`.
///
/// A single segment is returned as-is.
pub fn stitch_all(segments: &[AudioBuffer], crossfade_secs: f64) -> ReelResult<AudioBuffer> {
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| ReelError::input("nothing to stitch"))?;
    rest.iter()
        .try_fold(first.clone(), |acc, next| {
            crossfade_stitch(&acc, next, crossfade_secs)
        })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/stitch.rs"]
mod tests;
