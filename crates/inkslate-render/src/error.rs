//! Render errors.

use thiserror::Error;

/// Errors from building, rasterizing or encoding a page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG error: {0}")]
    Svg(String),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
