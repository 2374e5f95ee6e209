//! Export settings.

use inkslate_core::Colour;
use serde::{Deserialize, Serialize};

/// How a page is turned into pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page width in board units.
    pub width: u32,
    /// Page height in board units.
    pub height: u32,
    /// Fill behind every page.
    pub background: Colour,
    /// Output pixels per board unit (e.g. 2.0 for retina).
    pub scale: f32,
    /// Load installed fonts so text records render. Without them text is
    /// skipped by the rasterizer.
    pub load_system_fonts: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            background: Colour::WHITE,
            scale: 1.0,
            load_system_fonts: true,
        }
    }
}

impl ExportConfig {
    /// Output size in pixels, never zero.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        let w = (self.width as f32 * scale).round() as u32;
        let h = (self.height as f32 * scale).round() as u32;
        (w.max(1), h.max(1))
    }
}
