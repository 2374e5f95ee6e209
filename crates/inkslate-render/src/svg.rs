//! Page to SVG conversion.
//!
//! A page's live records are replayed in order into an SVG document that the
//! rasterizer then hands to resvg. Freehand and straight-line segments run
//! from the previous live record's position to the current one.

use crate::config::ExportConfig;
use crate::encode::encode_rgba_png;
use crate::error::RenderResult;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use inkslate_core::{Colour, DrawRecord, ImageRecord, Mark, OperationLog, TextRecord};
use std::fmt::Write;

/// Build the SVG document for one page.
pub fn page_to_svg(page: &OperationLog, config: &ExportConfig) -> RenderResult<String> {
    let (w, h) = (config.width.max(1), config.height.max(1));

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" {}/>",
        paint("fill", config.background)
    );

    let mut previous: Option<(i32, i32)> = None;
    for record in page.records() {
        match record {
            DrawRecord::NoDraw => continue,
            DrawRecord::PointCircle(m) => point_circle(&mut svg, m),
            DrawRecord::PointSquare(m) => point_square(&mut svg, m),
            DrawRecord::PointX(m) => point_x(&mut svg, m),
            // A start only anchors the segment that follows it.
            DrawRecord::LineStart(_) | DrawRecord::StraightLineStart(_) => {}
            DrawRecord::LinePoint(m) | DrawRecord::LineEnd(m) | DrawRecord::StraightLineEnd(m) => {
                if let Some(from) = previous {
                    segment(&mut svg, from, m);
                }
            }
            DrawRecord::Text(t) => text(&mut svg, t),
            DrawRecord::RasterImage(img) | DrawRecord::SvgImage(img) => image(&mut svg, img)?,
        }
        previous = record.position();
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// `fill="#RRGGBB" fill-opacity="a"` style attribute pair.
fn paint(attr: &str, colour: Colour) -> String {
    let opacity = f32::from(colour.alpha()) / 255.0;
    format!(
        "{attr}=\"#{:02X}{:02X}{:02X}\" {attr}-opacity=\"{opacity}\"",
        colour.red(),
        colour.green(),
        colour.blue(),
    )
}

fn half(size: i32) -> f32 {
    (size.max(1) as f32) / 2.0
}

fn point_circle(svg: &mut String, m: &Mark) {
    let _ = write!(
        svg,
        "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>",
        m.x,
        m.y,
        half(m.size),
        paint("fill", m.colour)
    );
}

fn point_square(svg: &mut String, m: &Mark) {
    let r = half(m.size);
    let side = r * 2.0;
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{side}\" height=\"{side}\" {}/>",
        m.x as f32 - r,
        m.y as f32 - r,
        paint("fill", m.colour)
    );
}

fn point_x(svg: &mut String, m: &Mark) {
    let r = half(m.size);
    let (x, y) = (m.x as f32, m.y as f32);
    let stroke_width = (r / 2.0).max(1.0);
    let _ = write!(
        svg,
        "<path d=\"M{} {} L{} {} M{} {} L{} {}\" fill=\"none\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\" {}/>",
        x - r,
        y - r,
        x + r,
        y + r,
        x + r,
        y - r,
        x - r,
        y + r,
        paint("stroke", m.colour)
    );
}

fn segment(svg: &mut String, (x1, y1): (i32, i32), to: &Mark) {
    let _ = write!(
        svg,
        "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{}\" y2=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" {}/>",
        to.x,
        to.y,
        to.size.max(1),
        paint("stroke", to.colour)
    );
}

fn text(svg: &mut String, t: &TextRecord) {
    let _ = write!(
        svg,
        "<text x=\"{x}\" y=\"{y}\" font-size=\"{}\" font-family=\"sans-serif\" transform=\"rotate({} {x} {y})\" {}>{}</text>",
        t.size.max(1),
        t.rotation_degrees,
        paint("fill", t.colour),
        escape_xml(&t.text),
        x = t.x,
        y = t.y,
    );
}

fn image(svg: &mut String, img: &ImageRecord) -> RenderResult<()> {
    let decoded = &img.image;
    let png_data = encode_rgba_png(decoded.pixels(), decoded.width(), decoded.height())?;
    let _ = write!(
        svg,
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" href=\"data:image/png;base64,{}\"/>",
        img.x,
        img.y,
        img.width.max(0),
        img.height.max(0),
        STANDARD.encode(&png_data)
    );
    Ok(())
}

/// Escape special XML characters. Characters XML 1.0 cannot carry at all
/// are dropped.
fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkslate_core::{DecodedImage, ImageLoader, ResourceLoadError};
    use std::path::Path;

    const RED: Colour = Colour::from_rgb(255, 0, 0);

    struct SolidLoader;

    impl ImageLoader for SolidLoader {
        fn load_raster(&self, _path: &Path) -> Result<DecodedImage, ResourceLoadError> {
            Ok(DecodedImage::new(1, 1, vec![0, 255, 0, 255]).unwrap())
        }

        fn load_svg(&self, path: &Path) -> Result<DecodedImage, ResourceLoadError> {
            self.load_raster(path)
        }
    }

    fn svg_of(page: &OperationLog) -> String {
        page_to_svg(page, &ExportConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_page() {
        let svg = svg_of(&OperationLog::new());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"1920\""));
        assert!(svg.contains("fill=\"#FFFFFF\" fill-opacity=\"1\""));
    }

    #[test]
    fn test_points() {
        let mut page = OperationLog::new();
        page.add_point_circle(10, 20, RED, 4).unwrap();
        page.add_point_square(30, 30, RED, 6).unwrap();
        page.add_point_x(50, 50, RED, 8).unwrap();
        let svg = svg_of(&page);
        assert!(svg.contains("<circle cx=\"10\" cy=\"20\" r=\"2\" fill=\"#FF0000\""));
        assert!(svg.contains("<rect x=\"27\" y=\"27\" width=\"6\" height=\"6\""));
        assert!(svg.contains("M46 46 L54 54 M54 46 L46 54"));
    }

    #[test]
    fn test_freehand_segments_follow_previous_record() {
        let mut page = OperationLog::new();
        page.add_freehand_start(0, 0, RED, 3).unwrap();
        page.add_freehand_mid(5, 5, RED, 3).unwrap();
        page.add_freehand_end(10, 0, RED, 3).unwrap();
        let svg = svg_of(&page);
        assert_eq!(svg.matches("<line").count(), 2);
        assert!(svg.contains("x1=\"0\" y1=\"0\" x2=\"5\" y2=\"5\""));
        assert!(svg.contains("x1=\"5\" y1=\"5\" x2=\"10\" y2=\"0\""));
    }

    #[test]
    fn test_straight_line() {
        let mut page = OperationLog::new();
        page.add_straight_line_start(1, 2, RED, 2).unwrap();
        page.add_straight_line_end(30, 40, RED, 2).unwrap();
        let svg = svg_of(&page);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains("x1=\"1\" y1=\"2\" x2=\"30\" y2=\"40\""));
    }

    #[test]
    fn test_undone_records_are_not_rendered() {
        let mut page = OperationLog::new();
        page.add_point_circle(1, 1, RED, 2).unwrap();
        page.add_freehand_start(0, 0, RED, 3).unwrap();
        page.add_freehand_end(9, 9, RED, 3).unwrap();
        page.undo_last();
        let svg = svg_of(&page);
        assert!(!svg.contains("<line"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_text_is_rotated_and_escaped() {
        let mut page = OperationLog::new();
        page.add_text("a < b & \"c\"", 100, 50, RED, 24, 90).unwrap();
        let svg = svg_of(&page);
        assert!(svg.contains("transform=\"rotate(90 100 50)\""));
        assert!(svg.contains("font-size=\"24\""));
        assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_control_characters_are_dropped_from_text() {
        let mut page = OperationLog::new();
        page.add_text("bell\u{7}x\ttab", 0, 0, RED, 12, 0).unwrap();
        let svg = svg_of(&page);
        assert!(svg.contains(">bellx\ttab</text>"));
        assert!(!svg.contains('\u{7}'));
    }

    #[test]
    fn test_image_is_embedded() {
        let mut page = OperationLog::new();
        page.add_raster_image(&SolidLoader, Path::new("/x.png"), 5, 6, 70, 80)
            .unwrap();
        let svg = svg_of(&page);
        assert!(svg.contains("<image x=\"5\" y=\"6\" width=\"70\" height=\"80\""));
        assert!(svg.contains("href=\"data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_translucent_colour() {
        let mut page = OperationLog::new();
        page.add_point_circle(0, 0, Colour(0x8000_00FF), 2).unwrap();
        let svg = svg_of(&page);
        assert!(svg.contains("fill=\"#0000FF\" fill-opacity=\"0.50"));
    }
}
