//! Page rasterization through resvg.

use crate::config::ExportConfig;
use crate::error::{RenderError, RenderResult};
use crate::svg::page_to_svg;
use inkslate_core::{OperationLog, PageRenderer};
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};

/// Renders pages onto fresh [`Pixmap`]s.
pub struct Rasterizer {
    config: ExportConfig,
    options: usvg::Options<'static>,
}

impl Rasterizer {
    pub fn new(config: ExportConfig) -> Self {
        let mut options = usvg::Options::default();
        if config.load_system_fonts {
            let fontdb = Arc::make_mut(&mut options.fontdb);
            fontdb.load_system_fonts();
            log::debug!("Loaded {} font faces", fontdb.len());
        }
        Self { config, options }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Rasterize an SVG document at the configured output size.
    pub fn render_svg(&self, svg: &str) -> RenderResult<Pixmap> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| RenderError::Svg(format!("SVG parsing failed: {e}")))?;

        let (px_w, px_h) = self.config.pixel_size();
        let mut pixmap = Pixmap::new(px_w, px_h)
            .ok_or_else(|| RenderError::Surface(format!("Cannot allocate {px_w}x{px_h} pixmap")))?;

        let size = tree.size();
        let transform = Transform::from_scale(
            px_w as f32 / size.width(),
            px_h as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(ExportConfig::default())
    }
}

impl PageRenderer for Rasterizer {
    type Surface = Pixmap;
    type Error = RenderError;

    fn render_page(&self, page: &OperationLog) -> RenderResult<Pixmap> {
        let svg = page_to_svg(page, &self.config)?;
        self.render_svg(&svg)
    }
}
