use super::*;
use std::io::Cursor;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decodes_and_resizes_to_target() {
    let res = Resolution::new(8, 6).unwrap();
    let frame = decode_image(&png_bytes(3, 5, [10, 20, 30, 255]), res).unwrap();
    assert_eq!((frame.width, frame.height), (8, 6));
    assert_eq!(frame.data.len(), 8 * 6 * 4);
    assert_eq!(&frame.data[0..4], &[10, 20, 30, 255]);
}

#[test]
fn output_is_opaque() {
    let res = Resolution::new(2, 2).unwrap();
    let frame = decode_image(&png_bytes(2, 2, [200, 100, 50, 0]), res).unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    assert_eq!(&frame.data[0..3], &[200, 100, 50]);
}

#[test]
fn garbage_bytes_are_render_errors() {
    let res = Resolution::new(2, 2).unwrap();
    assert!(matches!(
        decode_image(b"definitely not an image", res),
        Err(ReelError::Render(_))
    ));
}

#[test]
fn missing_file_is_render_error_naming_path() {
    let res = Resolution::new(2, 2).unwrap();
    let err = load_image(Path::new("/nonexistent/lifereel/x.png"), res).unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
    assert!(err.to_string().contains("x.png"));
}
