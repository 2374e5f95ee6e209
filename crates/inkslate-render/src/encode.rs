//! PNG encoding.

use crate::error::{RenderError, RenderResult};
use tiny_skia::Pixmap;

/// Encode straight-alpha RGBA8 pixels as a PNG.
pub fn encode_rgba_png(rgba: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
    }
    Ok(png_data)
}

/// Straight-alpha RGBA8 copy of a pixmap's premultiplied pixels.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    rgba
}

/// Encode a rendered page as a PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let png_data = encode_rgba_png(&demultiplied_rgba(pixmap), pixmap.width(), pixmap.height())?;
    log::debug!(
        "Encoded {}x{} page as {} PNG bytes",
        pixmap.width(),
        pixmap.height(),
        png_data.len()
    );
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic_and_size() {
        let rgba = [255u8, 0, 0, 255, 0, 0, 255, 128];
        let png_data = encode_rgba_png(&rgba, 2, 1).unwrap();
        assert_eq!(&png_data[..4], &[137, 80, 78, 71]);

        let decoded = image::load_from_memory(&png_data).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.into_raw(), rgba.to_vec());
    }

    #[test]
    fn test_wrong_length_is_an_error() {
        assert!(matches!(
            encode_rgba_png(&[0; 7], 2, 1),
            Err(RenderError::Encode(_))
        ));
    }

    #[test]
    fn test_pixmap_is_demultiplied() {
        let mut pixmap = Pixmap::new(1, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(200, 100, 50, 255));
        assert_eq!(demultiplied_rgba(&pixmap), vec![200, 100, 50, 255]);
        let png_data = encode_png(&pixmap).unwrap();
        assert_eq!(&png_data[1..4], b"PNG");
    }
}
