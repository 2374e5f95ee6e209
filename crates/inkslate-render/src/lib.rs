//! Inkslate Render Library
//!
//! Concrete collaborators for `inkslate-core`: a filesystem image loader and
//! a page rasterizer that goes through SVG, resvg and tiny-skia.

mod config;
mod encode;
mod error;
mod loader;
mod raster;
pub mod svg;

pub use config::ExportConfig;
pub use encode::{encode_png, encode_rgba_png};
pub use error::{RenderError, RenderResult};
pub use loader::FileImageLoader;
pub use raster::Rasterizer;

pub use tiny_skia::Pixmap;
