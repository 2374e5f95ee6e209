//! Decoded image handles and the image-loading collaborator.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading or decoding an embedded image.
#[derive(Debug, Error)]
pub enum ResourceLoadError {
    #[error("Failed to read image {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("Unsupported image format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Image path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
}

/// Which decoder an image record goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Raster,
    Svg,
}

impl ImageKind {
    /// Guess the kind from a file extension. Anything that is not SVG is
    /// handed to the raster decoder.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("svg") | Some("svgz") => ImageKind::Svg,
            _ => ImageKind::Raster,
        }
    }
}

/// A decoded image: straight-alpha RGBA8 pixels in row-major order.
///
/// Cloning shares the pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecodedImage {
    /// Wrap a pixel buffer. Returns `None` if the buffer length does not
    /// match `width * height * 4`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Decodes images referenced by the log.
///
/// Calls are synchronous; the caller blocks until decoding finishes.
pub trait ImageLoader {
    /// Decode a raster image (PNG, JPEG, ...).
    fn load_raster(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError>;

    /// Decode and rasterize an SVG document at its natural size.
    fn load_svg(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError>;

    /// Decode an image of the given kind.
    fn load(&self, kind: ImageKind, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        match kind {
            ImageKind::Raster => self.load_raster(path),
            ImageKind::Svg => self.load_svg(path),
        }
    }
}

impl<L: ImageLoader + ?Sized> ImageLoader for &L {
    fn load_raster(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        (**self).load_raster(path)
    }

    fn load_svg(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        (**self).load_svg(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A loader that fabricates images instead of reading files.

    use super::*;
    use std::cell::RefCell;

    /// Returns a 2x1 image for any path not listed in `missing`, and records
    /// every path it was asked for.
    #[derive(Default)]
    pub struct FakeLoader {
        pub missing: Vec<PathBuf>,
        pub requests: RefCell<Vec<PathBuf>>,
    }

    impl FakeLoader {
        fn fake(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
            self.requests.borrow_mut().push(path.to_path_buf());
            if self.missing.iter().any(|m| m == path) {
                return Err(ResourceLoadError::Read {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(DecodedImage::new(2, 1, vec![255; 8]).unwrap())
        }
    }

    impl ImageLoader for FakeLoader {
        fn load_raster(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
            self.fake(path)
        }

        fn load_svg(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
            self.fake(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_image_checks_length() {
        assert!(DecodedImage::new(2, 2, vec![0; 16]).is_some());
        assert!(DecodedImage::new(2, 2, vec![0; 15]).is_none());
        assert!(DecodedImage::new(0, 0, Vec::new()).is_some());
    }

    #[test]
    fn test_clone_shares_pixels() {
        let img = DecodedImage::new(1, 1, vec![1, 2, 3, 4]).unwrap();
        let copy = img.clone();
        assert_eq!(img, copy);
        assert_eq!(copy.pixels(), &[1, 2, 3, 4]);
        assert!(std::ptr::eq(img.pixels().as_ptr(), copy.pixels().as_ptr()));
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ImageKind::from_path(Path::new("a/b.SVG")), ImageKind::Svg);
        assert_eq!(ImageKind::from_path(Path::new("b.png")), ImageKind::Raster);
        assert_eq!(ImageKind::from_path(Path::new("noext")), ImageKind::Raster);
    }
}
