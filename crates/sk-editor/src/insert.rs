//! Image insertion: decode pixel size, fit into the placement box.

use crate::error::{EditorError, Result};

/// Decoded pixel dimensions of an encoded image (PNG, JPEG, ...).
///
/// # Errors
/// `ImageDecode` when the bytes are not a supported image, `EmptyImage`
/// for a zero-sized one.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = (img.width(), img.height());
    log::debug!("decoded image {w}x{h}");
    if w == 0 || h == 0 {
        return Err(EditorError::EmptyImage);
    }
    Ok((w, h))
}

/// Scale `(width, height)` so the longer side is at most `max_side`,
/// preserving the aspect ratio. Smaller images keep their size.
pub fn fit_within(width: f32, height: f32, max_side: f32) -> (f32, f32) {
    let longer = width.max(height);
    if longer <= max_side || longer <= 0.0 {
        return (width, height);
    }
    let k = max_side / longer;
    (width * k, height * k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        image::RgbaImage::new(w, h)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png_size() {
        assert_eq!(decode_dimensions(&png(12, 7)).unwrap(), (12, 7));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_dimensions(b"not an image"),
            Err(EditorError::ImageDecode(_))
        ));
    }

    #[test]
    fn fit_keeps_aspect_on_longer_side() {
        assert_eq!(fit_within(1200.0, 600.0, 300.0), (300.0, 150.0));
        assert_eq!(fit_within(600.0, 1200.0, 300.0), (150.0, 300.0));
        assert_eq!(fit_within(100.0, 50.0, 300.0), (100.0, 50.0));
    }
}
