use std::sync::Arc;

use rayon::prelude::*;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::lerp_u8;
use crate::video::frame::{Frame, StreamFrame};

const ROW_CHUNK_BYTES: usize = 64 * 1024;

/// Per-pixel `a*(1-alpha) + b*alpha` on the stored 8-bit values.
pub fn crossfade(a: &Frame, b: &Frame, alpha: f32) -> ReelResult<Frame> {
    let mut out = Frame {
        width: a.width,
        height: a.height,
        data: Vec::new(),
    };
    crossfade_into(a, b, alpha, &mut out)?;
    Ok(out)
}

/// [`crossfade`] into `out`, reusing its buffer.
pub fn crossfade_into(a: &Frame, b: &Frame, alpha: f32, out: &mut Frame) -> ReelResult<()> {
    check_same_size(a, b)?;
    let alpha = alpha.clamp(0.0, 1.0);
    out.width = a.width;
    out.height = a.height;
    out.data.resize(a.data.len(), 0);
    out.data
        .par_chunks_mut(ROW_CHUNK_BYTES)
        .zip(a.data.par_chunks(ROW_CHUNK_BYTES))
        .zip(b.data.par_chunks(ROW_CHUNK_BYTES))
        .for_each(|((d, sa), sb)| {
            for ((d, &x), &y) in d.iter_mut().zip(sa).zip(sb) {
                *d = lerp_u8(x, y, alpha);
            }
        });
    Ok(())
}

/// `count` positions fading from `a` to `b` with `alpha = t / count`, `t in 0..count`.
///
/// The first position is `a` itself; the rest are lazy blends.
pub fn transition(a: &Arc<Frame>, b: &Arc<Frame>, count: usize) -> ReelResult<Vec<StreamFrame>> {
    check_same_size(a, b)?;
    Ok((0..count)
        .map(|t| match t {
            0 => StreamFrame::Still(Arc::clone(a)),
            _ => StreamFrame::Blend {
                from: Arc::clone(a),
                to: Arc::clone(b),
                alpha: t as f32 / count as f32,
            },
        })
        .collect())
}

fn check_same_size(a: &Frame, b: &Frame) -> ReelResult<()> {
    if a.width != b.width || a.height != b.height {
        return Err(ReelError::render(format!(
            "crossfade size mismatch: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/video/blend.rs"]
mod tests;
