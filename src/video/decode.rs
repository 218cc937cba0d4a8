use std::path::Path;

use anyhow::Context as _;
use image::imageops::FilterType;

use crate::foundation::core::Resolution;
use crate::foundation::error::{ReelError, ReelResult};
use crate::video::frame::Frame;

/// Decode encoded image bytes and resize them to exactly `resolution`.
///
/// Aspect ratio is not preserved; the picture is stretched to fill the frame.
pub fn decode_image(bytes: &[u8], resolution: Resolution) -> ReelResult<Frame> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ReelError::render(format!("decode image: {e}")))?;
    Ok(fit_image(&dyn_img, resolution))
}

/// Read and decode an image file, see [`decode_image`].
pub fn load_image(path: &Path, resolution: Resolution) -> ReelResult<Frame> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(|e| ReelError::render(format!("{e:#}")))?;
    decode_image(&bytes, resolution)
        .map_err(|e| ReelError::render(format!("'{}': {e}", path.display())))
}

/// Resize an already-decoded image to an opaque RGBA8 frame.
pub fn fit_image(img: &image::DynamicImage, resolution: Resolution) -> Frame {
    let resized = if img.width() == resolution.width && img.height() == resolution.height {
        img.to_rgba8()
    } else {
        img.resize_exact(resolution.width, resolution.height, FilterType::CatmullRom)
            .to_rgba8()
    };

    let mut data = resized.into_raw();
    for px in data.chunks_exact_mut(4) {
        px[3] = 255;
    }
    Frame {
        width: resolution.width,
        height: resolution.height,
        data,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/video/decode.rs"]
mod tests;
