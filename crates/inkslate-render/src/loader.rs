//! Image decoding from the filesystem.

use crate::encode::demultiplied_rgba;
use image::ImageError;
use inkslate_core::{DecodedImage, ImageLoader, ResourceLoadError};
use std::path::Path;
use tiny_skia::{Pixmap, Transform};

/// Decodes raster images with `image` and rasterizes SVGs with resvg at
/// their natural size.
pub struct FileImageLoader {
    options: usvg::Options<'static>,
}

impl Default for FileImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    fn read(path: &Path) -> Result<Vec<u8>, ResourceLoadError> {
        std::fs::read(path).map_err(|source| ResourceLoadError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> ResourceLoadError {
    ResourceLoadError::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl ImageLoader for FileImageLoader {
    fn load_raster(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        let bytes = Self::read(path)?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| match e {
            ImageError::Unsupported(_) => ResourceLoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            },
            other => decode_error(path, other),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded {} ({width}x{height})", path.display());
        DecodedImage::new(width, height, rgba.into_raw())
            .ok_or_else(|| decode_error(path, "pixel buffer size mismatch"))
    }

    fn load_svg(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        let bytes = Self::read(path)?;
        let tree = usvg::Tree::from_data(&bytes, &self.options).map_err(|e| decode_error(path, e))?;

        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| decode_error(path, "SVG has an empty canvas"))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        log::debug!(
            "Rasterized {} ({}x{})",
            path.display(),
            pixmap.width(),
            pixmap.height()
        );
        DecodedImage::new(pixmap.width(), pixmap.height(), demultiplied_rgba(&pixmap))
            .ok_or_else(|| decode_error(path, "pixel buffer size mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_rgba_png;
    use inkslate_core::{Colour, DrawRecord, OperationLog};
    use tempfile::tempdir;

    const GREEN_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="#00FF00"/></svg>"##;

    #[test]
    fn test_load_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dot.png");
        let pixels = [10u8, 20, 30, 255, 40, 50, 60, 128];
        std::fs::write(&path, encode_rgba_png(&pixels, 2, 1).unwrap()).unwrap();

        let image = FileImageLoader::new().load_raster(&path).unwrap();
        assert_eq!((image.width(), image.height()), (2, 1));
        assert_eq!(image.pixels(), &pixels);
    }

    #[test]
    fn test_load_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("green.svg");
        std::fs::write(&path, GREEN_SVG).unwrap();

        let image = FileImageLoader::new().load_svg(&path).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(&image.pixels()[..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = FileImageLoader::new().load_raster(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(ResourceLoadError::Read { .. })));
    }

    #[test]
    fn test_garbage_bytes() {
        let dir = tempdir().unwrap();
        let raster = dir.path().join("junk.png");
        std::fs::write(&raster, b"definitely not an image").unwrap();
        let loader = FileImageLoader::new();
        assert!(matches!(
            loader.load_raster(&raster),
            Err(ResourceLoadError::UnsupportedFormat { .. })
        ));

        let svg = dir.path().join("junk.svg");
        std::fs::write(&svg, b"<svg").unwrap();
        assert!(matches!(
            loader.load_svg(&svg),
            Err(ResourceLoadError::Decode { .. })
        ));
    }

    #[test]
    fn test_log_records_decoded_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("green.svg");
        std::fs::write(&path, GREEN_SVG).unwrap();

        let mut page = OperationLog::new();
        page.add_point_x(0, 0, Colour::BLACK, 2).unwrap();
        page.add_svg_image(&FileImageLoader::new(), &path, 10, 10, 40, 20)
            .unwrap();
        match page.records().last() {
            Some(DrawRecord::SvgImage(img)) => {
                assert_eq!(img.filename, path);
                assert_eq!(img.image.width(), 4);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }
}
