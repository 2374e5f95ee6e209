//! Binary board format.
//!
//! All integers are little-endian and fixed width. Strings are a `u32` byte
//! length followed by UTF-8 bytes.
//!
//! ```text
//! u32 page_count
//! page_count x {
//!     u32  op_count
//!     u32  lock_index
//!     u8   locked (0 or 1)
//!     op_count x {
//!         u32 tag
//!         point / line kinds: i32 x, i32 y, u32 colour, i32 size
//!         text:               i32 x, i32 y, u32 colour, i32 size, i32 rotation, string
//!         raster / svg image: i32 x, i32 y, i32 width, i32 height, string path
//!     }
//! }
//! page_count x string title
//! ```
//!
//! Image paths are written relative to the board file's directory.

use super::path::{relative_reference, resolve_reference};
use super::{StorageError, StorageResult};
use crate::board::Whiteboard;
use crate::config::BoardConfig;
use crate::image::{ImageKind, ImageLoader};
use crate::operations::{AppendError, OperationLog};
use crate::record::{Colour, DrawRecord, ImageRecord, Mark, RecordKind};
use std::io::{self, Read, Write};
use std::path::Path;

/// Encode every live page of `board`. `document` is where the bytes will be
/// stored; image paths are made relative to its directory.
pub fn encode_board<W: Write>(board: &Whiteboard, document: &Path, writer: W) -> StorageResult<()> {
    let mut out = Encoder { writer };

    out.write_len(board.total_images(), "page count")?;
    for page in board.pages() {
        encode_page(&mut out, page, document)?;
    }
    for page in board.pages() {
        out.write_str(page.title())?;
    }
    out.writer.flush()?;
    Ok(())
}

fn encode_page<W: Write>(out: &mut Encoder<W>, page: &OperationLog, document: &Path) -> StorageResult<()> {
    out.write_len(page.len(), "record count")?;
    // An unlocked log may keep a stale index above its count; only the part
    // that still refers to live records is meaningful.
    out.write_len(page.lock_index().min(page.len()), "lock index")?;
    out.write_bool(page.is_locked())?;

    for record in page.records() {
        out.write_u32(record.kind().tag())?;
        match record {
            DrawRecord::NoDraw => {
                return Err(StorageError::Other(
                    "tombstone inside the live range".to_string(),
                ));
            }
            DrawRecord::Text(text) => {
                out.write_i32(text.x)?;
                out.write_i32(text.y)?;
                out.write_u32(text.colour.argb())?;
                out.write_i32(text.size)?;
                out.write_i32(text.rotation_degrees)?;
                out.write_str(&text.text)?;
            }
            DrawRecord::RasterImage(image) | DrawRecord::SvgImage(image) => {
                encode_image(out, image, document)?;
            }
            mark_record => {
                // Every remaining variant carries a mark.
                if let Some(mark) = mark_record.mark() {
                    out.write_i32(mark.x)?;
                    out.write_i32(mark.y)?;
                    out.write_u32(mark.colour.argb())?;
                    out.write_i32(mark.size)?;
                }
            }
        }
    }
    Ok(())
}

fn encode_image<W: Write>(out: &mut Encoder<W>, image: &ImageRecord, document: &Path) -> StorageResult<()> {
    out.write_i32(image.x)?;
    out.write_i32(image.y)?;
    out.write_i32(image.width)?;
    out.write_i32(image.height)?;
    let reference = relative_reference(document, &image.filename).ok_or_else(|| {
        StorageError::Other(format!(
            "Image path is not valid UTF-8: {}",
            image.filename.display()
        ))
    })?;
    out.write_str(&reference)
}

/// Decode a board. `document` is where the bytes were read from; stored
/// image references are resolved against its directory and decoded again
/// through `loader`.
///
/// Nothing is returned unless the whole stream decodes.
pub fn decode_board<R: Read>(
    reader: R,
    document: &Path,
    loader: &dyn ImageLoader,
    config: &BoardConfig,
) -> StorageResult<Whiteboard> {
    let config = &config.clamped();
    let mut input = Decoder { reader, offset: 0 };

    let page_count = input.read_u32()?;
    if page_count == 0 {
        return Err(input.malformed("board has no pages"));
    }

    let mut pages = Vec::new();
    for _ in 0..page_count {
        pages.push(decode_page(&mut input, document, loader, config)?);
    }
    for page in &mut pages {
        let title = input.read_string()?;
        page.set_title(title);
    }

    log::debug!("Decoded {page_count} pages ({} bytes)", input.offset);
    Ok(Whiteboard::from_pages(pages, config))
}

fn decode_page<R: Read>(
    input: &mut Decoder<R>,
    document: &Path,
    loader: &dyn ImageLoader,
    config: &BoardConfig,
) -> StorageResult<OperationLog> {
    let op_count = input.read_u32()?;
    let lock_index = input.read_u32()?;
    let locked = input.read_bool()?;

    let mut page = OperationLog::with_capacity(config.page_capacity);
    for _ in 0..op_count {
        let record_start = input.offset;
        let tag = input.read_u32()?;
        let kind = RecordKind::from_tag(tag)
            .ok_or_else(|| input.malformed_at(record_start, format!("unknown record tag {tag}")))?;

        let appended = match kind {
            RecordKind::NoDraw => {
                return Err(input.malformed_at(record_start, "tombstone record in file"));
            }
            RecordKind::Text => {
                let x = input.read_i32()?;
                let y = input.read_i32()?;
                let colour = Colour(input.read_u32()?);
                let size = input.read_i32()?;
                let rotation = input.read_i32()?;
                let text = input.read_string()?;
                page.add_text(&text, x, y, colour, size, rotation)
            }
            RecordKind::RasterImage | RecordKind::SvgImage => {
                let image_kind = if kind == RecordKind::SvgImage {
                    ImageKind::Svg
                } else {
                    ImageKind::Raster
                };
                let x = input.read_i32()?;
                let y = input.read_i32()?;
                let width = input.read_i32()?;
                let height = input.read_i32()?;
                let stored = input.read_string()?;
                let path = resolve_reference(document, &stored);
                page.add_image(image_kind, loader, &path, x, y, width, height)
            }
            mark_kind => {
                let x = input.read_i32()?;
                let y = input.read_i32()?;
                let colour = Colour(input.read_u32()?);
                let size = input.read_i32()?;
                page.add_mark(mark_kind, Mark::new(x, y, colour, size))
            }
        };

        appended.map_err(|e| match e {
            AppendError::ResourceLoad(e) => StorageError::ResourceLoad(e),
            sequence @ AppendError::OutOfSequence { .. } => {
                input.malformed_at(record_start, sequence.to_string())
            }
        })?;
    }

    if !page.restore_lock(lock_index as usize, locked) {
        return Err(input.malformed(format!(
            "lock index {lock_index} exceeds record count {op_count}"
        )));
    }
    Ok(page)
}

struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.writer.write_all(&value.to_le_bytes())
    }

    fn write_i32(&mut self, value: i32) -> io::Result<()> {
        self.writer.write_all(&value.to_le_bytes())
    }

    fn write_bool(&mut self, value: bool) -> io::Result<()> {
        self.writer.write_all(&[u8::from(value)])
    }

    fn write_len(&mut self, len: usize, what: &str) -> StorageResult<()> {
        let len = u32::try_from(len)
            .map_err(|_| StorageError::TooLarge(format!("{what} {len} exceeds u32")))?;
        Ok(self.write_u32(len)?)
    }

    fn write_str(&mut self, value: &str) -> StorageResult<()> {
        self.write_len(value.len(), "string length")?;
        Ok(self.writer.write_all(value.as_bytes())?)
    }
}

struct Decoder<R: Read> {
    reader: R,
    offset: u64,
}

impl<R: Read> Decoder<R> {
    fn malformed(&self, reason: impl Into<String>) -> StorageError {
        self.malformed_at(self.offset, reason)
    }

    fn malformed_at(&self, offset: u64, reason: impl Into<String>) -> StorageError {
        StorageError::Malformed {
            offset,
            reason: reason.into(),
        }
    }

    fn read_array<const N: usize>(&mut self) -> StorageResult<[u8; N]> {
        let mut buf = [0u8; N];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.offset += N as u64;
                Ok(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(self.malformed("unexpected end of file"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_u32(&mut self) -> StorageResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> StorageResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_bool(&mut self) -> StorageResult<bool> {
        match self.read_array::<1>()? {
            [0] => Ok(false),
            [1] => Ok(true),
            [other] => Err(self.malformed(format!("invalid flag byte {other}"))),
        }
    }

    fn read_string(&mut self) -> StorageResult<String> {
        let len = self.read_u32()? as u64;
        // Read through `take` so a corrupt length cannot force a huge
        // allocation up front.
        let mut bytes = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut bytes)?;
        if (bytes.len() as u64) < len {
            self.offset += bytes.len() as u64;
            return Err(self.malformed("unexpected end of file inside string"));
        }
        let start = self.offset;
        self.offset += len;
        String::from_utf8(bytes).map_err(|_| self.malformed_at(start, "string is not valid UTF-8"))
    }
}
