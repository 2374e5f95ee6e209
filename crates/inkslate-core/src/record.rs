//! Draw records: the primitive entries of an operation log.
//!
//! A page is rebuilt by replaying its records in order. Points, freehand
//! strokes and straight lines share a common shape ([`Mark`]); text and
//! embedded images carry their own owned payloads.

use crate::image::DecodedImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An ARGB colour packed into a `u32` (`0xAARRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
    pub const BLACK: Colour = Colour(0xFF00_0000);
    pub const WHITE: Colour = Colour(0xFFFF_FFFF);

    /// Build a colour from its four components.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Build an opaque colour.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xFF, r, g, b)
    }

    /// The packed `0xAARRGGBB` value.
    pub const fn argb(self) -> u32 {
        self.0
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl From<u32> for Colour {
    fn from(argb: u32) -> Self {
        Self(argb)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Kind tag of a record. The discriminant is the value written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RecordKind {
    /// Tombstone left behind by undo. Never rendered or written.
    NoDraw = 0,
    PointCircle = 1,
    PointSquare = 2,
    PointX = 3,
    LineStart = 4,
    LinePoint = 5,
    LineEnd = 6,
    StraightLineStart = 7,
    StraightLineEnd = 8,
    Text = 9,
    RasterImage = 10,
    SvgImage = 11,
}

impl RecordKind {
    /// Wire tag for this kind.
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Look up a kind from its wire tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => RecordKind::NoDraw,
            1 => RecordKind::PointCircle,
            2 => RecordKind::PointSquare,
            3 => RecordKind::PointX,
            4 => RecordKind::LineStart,
            5 => RecordKind::LinePoint,
            6 => RecordKind::LineEnd,
            7 => RecordKind::StraightLineStart,
            8 => RecordKind::StraightLineEnd,
            9 => RecordKind::Text,
            10 => RecordKind::RasterImage,
            11 => RecordKind::SvgImage,
            _ => return None,
        })
    }

    /// Whether this kind leaves a composite stroke open, so that only a
    /// continuation of that stroke may follow it.
    pub const fn opens_stroke(self) -> bool {
        matches!(
            self,
            RecordKind::LineStart | RecordKind::LinePoint | RecordKind::StraightLineStart
        )
    }

    /// Human readable name, used in logs and the CLI.
    pub const fn name(self) -> &'static str {
        match self {
            RecordKind::NoDraw => "no-draw",
            RecordKind::PointCircle => "point-circle",
            RecordKind::PointSquare => "point-square",
            RecordKind::PointX => "point-x",
            RecordKind::LineStart => "line-start",
            RecordKind::LinePoint => "line-point",
            RecordKind::LineEnd => "line-end",
            RecordKind::StraightLineStart => "straight-line-start",
            RecordKind::StraightLineEnd => "straight-line-end",
            RecordKind::Text => "text",
            RecordKind::RasterImage => "raster-image",
            RecordKind::SvgImage => "svg-image",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields shared by point, freehand and straight-line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mark {
    pub x: i32,
    pub y: i32,
    pub colour: Colour,
    /// Point size or line thickness in pixels.
    pub size: i32,
}

impl Mark {
    pub fn new(x: i32, y: i32, colour: Colour, size: i32) -> Self {
        Self { x, y, colour, size }
    }
}

/// A run of text anchored at `(x, y)`, rotated about that anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub x: i32,
    pub y: i32,
    pub colour: Colour,
    /// Font size in pixels.
    pub size: i32,
    pub rotation_degrees: i32,
    pub text: String,
}

/// An embedded raster or SVG image, placed with its top-left corner at
/// `(x, y)` and scaled to `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Where the image was loaded from.
    pub filename: PathBuf,
    /// Decoded pixels, owned by the record.
    pub image: DecodedImage,
}

/// One entry of an operation log.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawRecord {
    /// Empty slot.
    #[default]
    NoDraw,
    PointCircle(Mark),
    PointSquare(Mark),
    PointX(Mark),
    LineStart(Mark),
    LinePoint(Mark),
    LineEnd(Mark),
    StraightLineStart(Mark),
    StraightLineEnd(Mark),
    Text(TextRecord),
    RasterImage(ImageRecord),
    SvgImage(ImageRecord),
}

impl DrawRecord {
    /// The record's kind tag.
    pub fn kind(&self) -> RecordKind {
        match self {
            DrawRecord::NoDraw => RecordKind::NoDraw,
            DrawRecord::PointCircle(_) => RecordKind::PointCircle,
            DrawRecord::PointSquare(_) => RecordKind::PointSquare,
            DrawRecord::PointX(_) => RecordKind::PointX,
            DrawRecord::LineStart(_) => RecordKind::LineStart,
            DrawRecord::LinePoint(_) => RecordKind::LinePoint,
            DrawRecord::LineEnd(_) => RecordKind::LineEnd,
            DrawRecord::StraightLineStart(_) => RecordKind::StraightLineStart,
            DrawRecord::StraightLineEnd(_) => RecordKind::StraightLineEnd,
            DrawRecord::Text(_) => RecordKind::Text,
            DrawRecord::RasterImage(_) => RecordKind::RasterImage,
            DrawRecord::SvgImage(_) => RecordKind::SvgImage,
        }
    }

    /// Build a mark-shaped record of the given kind.
    ///
    /// Returns `None` for kinds that do not carry a [`Mark`].
    pub fn from_mark(kind: RecordKind, mark: Mark) -> Option<Self> {
        Some(match kind {
            RecordKind::PointCircle => DrawRecord::PointCircle(mark),
            RecordKind::PointSquare => DrawRecord::PointSquare(mark),
            RecordKind::PointX => DrawRecord::PointX(mark),
            RecordKind::LineStart => DrawRecord::LineStart(mark),
            RecordKind::LinePoint => DrawRecord::LinePoint(mark),
            RecordKind::LineEnd => DrawRecord::LineEnd(mark),
            RecordKind::StraightLineStart => DrawRecord::StraightLineStart(mark),
            RecordKind::StraightLineEnd => DrawRecord::StraightLineEnd(mark),
            _ => return None,
        })
    }

    /// The common mark fields, for point and line records.
    pub fn mark(&self) -> Option<&Mark> {
        match self {
            DrawRecord::PointCircle(m)
            | DrawRecord::PointSquare(m)
            | DrawRecord::PointX(m)
            | DrawRecord::LineStart(m)
            | DrawRecord::LinePoint(m)
            | DrawRecord::LineEnd(m)
            | DrawRecord::StraightLineStart(m)
            | DrawRecord::StraightLineEnd(m) => Some(m),
            _ => None,
        }
    }

    /// Anchor position of the record, if it has one.
    pub fn position(&self) -> Option<(i32, i32)> {
        match self {
            DrawRecord::NoDraw => None,
            DrawRecord::Text(t) => Some((t.x, t.y)),
            DrawRecord::RasterImage(i) | DrawRecord::SvgImage(i) => Some((i.x, i.y)),
            other => other.mark().map(|m| (m.x, m.y)),
        }
    }

    pub fn is_no_draw(&self) -> bool {
        matches!(self, DrawRecord::NoDraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_components() {
        let c = Colour::from_argb(0x80, 0x11, 0x22, 0x33);
        assert_eq!(c.argb(), 0x8011_2233);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x11);
        assert_eq!(c.green(), 0x22);
        assert_eq!(c.blue(), 0x33);
        assert_eq!(Colour::from_rgb(0, 0, 0), Colour::BLACK);
        assert_eq!(c.to_string(), "#80112233");
    }

    #[test]
    fn test_kind_tags_are_stable() {
        for tag in 0..=11 {
            let kind = RecordKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert!(RecordKind::from_tag(12).is_none());
        assert!(RecordKind::from_tag(u32::MAX).is_none());
    }

    #[test]
    fn test_from_mark_only_for_mark_kinds() {
        let mark = Mark::new(1, 2, Colour::BLACK, 3);
        let rec = DrawRecord::from_mark(RecordKind::LinePoint, mark).unwrap();
        assert_eq!(rec.kind(), RecordKind::LinePoint);
        assert_eq!(rec.mark(), Some(&mark));
        assert!(DrawRecord::from_mark(RecordKind::Text, mark).is_none());
        assert!(DrawRecord::from_mark(RecordKind::NoDraw, mark).is_none());
    }

    #[test]
    fn test_open_stroke_kinds() {
        assert!(RecordKind::LineStart.opens_stroke());
        assert!(RecordKind::LinePoint.opens_stroke());
        assert!(RecordKind::StraightLineStart.opens_stroke());
        assert!(!RecordKind::LineEnd.opens_stroke());
        assert!(!RecordKind::StraightLineEnd.opens_stroke());
        assert!(!RecordKind::Text.opens_stroke());
    }

    #[test]
    fn test_position() {
        let text = DrawRecord::Text(TextRecord {
            x: 4,
            y: 5,
            colour: Colour::BLACK,
            size: 12,
            rotation_degrees: 90,
            text: "hi".to_string(),
        });
        assert_eq!(text.position(), Some((4, 5)));
        assert_eq!(DrawRecord::NoDraw.position(), None);
        assert!(DrawRecord::default().is_no_draw());
    }
}
