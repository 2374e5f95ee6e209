//! The operation log: one page's drawing history.
//!
//! Records are appended in call order into a slot arena whose physical size
//! (the capacity) only ever doubles. Slots past the live count hold
//! [`DrawRecord::NoDraw`]. Undo works from the tail, tombstoning whole
//! freehand strokes and straight lines in one step, and never goes below the
//! lock floor while the log is locked.

use crate::image::{ImageKind, ImageLoader, ResourceLoadError};
use crate::record::{Colour, DrawRecord, ImageRecord, Mark, RecordKind, TextRecord};
use std::path::Path;
use thiserror::Error;

/// Number of record slots a fresh page starts with.
pub const DEFAULT_PAGE_CAPACITY: usize = 1024;

/// Smallest `initial * 2^k` that is strictly greater than `required`.
///
/// Sizes the page slots of a board rebuilt from a file, so that it has the
/// room it would have reached by inserting pages one at a time.
pub fn determine_capacity(required: usize, initial: usize) -> usize {
    let mut capacity = initial.max(1);
    while capacity <= required {
        match capacity.checked_mul(2) {
            Some(next) => capacity = next,
            None => return usize::MAX,
        }
    }
    capacity
}

/// Errors returned by the append operations. The log is unchanged when one
/// is returned.
#[derive(Debug, Error)]
pub enum AppendError {
    #[error(transparent)]
    ResourceLoad(#[from] ResourceLoadError),
    #[error("{kind} cannot follow {}", describe_previous(*previous))]
    OutOfSequence {
        kind: RecordKind,
        previous: Option<RecordKind>,
    },
}

fn describe_previous(previous: Option<RecordKind>) -> String {
    match previous {
        Some(kind) => kind.to_string(),
        None => "the start of the log".to_string(),
    }
}

/// Result type for append operations.
pub type AppendResult = Result<(), AppendError>;

/// What an [`OperationLog::undo_last`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Nothing to undo.
    Empty,
    /// The log is locked and the live count already sits on the lock floor.
    LockFloor,
    /// This many records were tombstoned.
    Removed(usize),
}

impl UndoOutcome {
    /// Number of records removed.
    pub fn removed(self) -> usize {
        match self {
            UndoOutcome::Removed(n) => n,
            _ => 0,
        }
    }
}

/// Ordered history of draw records for a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLog {
    /// Physical slots; `slots.len()` is the capacity.
    slots: Vec<DrawRecord>,
    /// Number of live records at the front of `slots`.
    count: usize,
    title: String,
    locked: bool,
    lock_index: usize,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationLog {
    /// Create an empty log with [`DEFAULT_PAGE_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PAGE_CAPACITY)
    }

    /// Create an empty log with room for `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity.max(1), DrawRecord::default);
        Self {
            slots,
            count: 0,
            title: String::new(),
            locked: false,
            lock_index: 0,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of physical slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live records in append order.
    pub fn records(&self) -> &[DrawRecord] {
        &self.slots[..self.count]
    }

    /// Physical slot `index`, live or not.
    pub fn slot(&self, index: usize) -> Option<&DrawRecord> {
        self.slots.get(index)
    }

    /// Kind of the last live record.
    pub fn last_kind(&self) -> Option<RecordKind> {
        self.records().last().map(DrawRecord::kind)
    }

    /// Whether a freehand stroke or straight line is waiting for its end.
    pub fn stroke_open(&self) -> bool {
        self.last_kind().is_some_and(RecordKind::opens_stroke)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Record count captured by the most recent [`lock`](Self::lock).
    pub fn lock_index(&self) -> usize {
        self.lock_index
    }

    /// Freeze everything appended so far against undo.
    pub fn lock(&mut self) {
        self.locked = true;
        self.lock_index = self.count;
    }

    /// Allow undo below the lock index again. The index itself is kept until
    /// the next lock.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Restore a lock state read from a file. Fails if the index is past the
    /// live count.
    pub(crate) fn restore_lock(&mut self, lock_index: usize, locked: bool) -> bool {
        if lock_index > self.count {
            return false;
        }
        self.lock_index = lock_index;
        self.locked = locked;
        true
    }

    /// Drop every live record and clear title and lock. Capacity is kept.
    pub fn reset(&mut self) {
        for slot in &mut self.slots[..self.count] {
            *slot = DrawRecord::NoDraw;
        }
        self.count = 0;
        self.title.clear();
        self.locked = false;
        self.lock_index = 0;
    }

    pub fn add_point_circle(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::PointCircle, Mark::new(x, y, colour, size))
    }

    pub fn add_point_square(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::PointSquare, Mark::new(x, y, colour, size))
    }

    pub fn add_point_x(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::PointX, Mark::new(x, y, colour, size))
    }

    /// Begin a freehand stroke.
    pub fn add_freehand_start(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::LineStart, Mark::new(x, y, colour, size))
    }

    /// Continue the open freehand stroke.
    pub fn add_freehand_mid(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::LinePoint, Mark::new(x, y, colour, size))
    }

    /// Finish the open freehand stroke.
    pub fn add_freehand_end(&mut self, x: i32, y: i32, colour: Colour, size: i32) -> AppendResult {
        self.add_mark(RecordKind::LineEnd, Mark::new(x, y, colour, size))
    }

    pub fn add_straight_line_start(
        &mut self,
        x: i32,
        y: i32,
        colour: Colour,
        size: i32,
    ) -> AppendResult {
        self.add_mark(RecordKind::StraightLineStart, Mark::new(x, y, colour, size))
    }

    pub fn add_straight_line_end(
        &mut self,
        x: i32,
        y: i32,
        colour: Colour,
        size: i32,
    ) -> AppendResult {
        self.add_mark(RecordKind::StraightLineEnd, Mark::new(x, y, colour, size))
    }

    /// Append a text record. The log keeps its own copy of `text`.
    pub fn add_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        colour: Colour,
        size: i32,
        rotation_degrees: i32,
    ) -> AppendResult {
        self.check_sequence(RecordKind::Text)?;
        self.push(DrawRecord::Text(TextRecord {
            x,
            y,
            colour,
            size,
            rotation_degrees,
            text: text.to_owned(),
        }));
        Ok(())
    }

    /// Decode a raster image through `loader` and append it.
    pub fn add_raster_image(
        &mut self,
        loader: &dyn ImageLoader,
        path: &Path,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> AppendResult {
        self.add_image(ImageKind::Raster, loader, path, x, y, width, height)
    }

    /// Decode an SVG image through `loader` and append it.
    pub fn add_svg_image(
        &mut self,
        loader: &dyn ImageLoader,
        path: &Path,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> AppendResult {
        self.add_image(ImageKind::Svg, loader, path, x, y, width, height)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_image(
        &mut self,
        kind: ImageKind,
        loader: &dyn ImageLoader,
        path: &Path,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> AppendResult {
        let record_kind = match kind {
            ImageKind::Raster => RecordKind::RasterImage,
            ImageKind::Svg => RecordKind::SvgImage,
        };
        self.check_sequence(record_kind)?;
        if path.to_str().is_none() {
            let err = ResourceLoadError::NonUtf8Path {
                path: path.to_path_buf(),
            };
            log::warn!("{err}");
            return Err(err.into());
        }

        let image = loader.load(kind, path).inspect_err(|e| {
            log::warn!("{e}");
        })?;
        let record = ImageRecord {
            x,
            y,
            width,
            height,
            filename: path.to_path_buf(),
            image,
        };
        self.push(match kind {
            ImageKind::Raster => DrawRecord::RasterImage(record),
            ImageKind::Svg => DrawRecord::SvgImage(record),
        });
        Ok(())
    }

    /// Append a mark-shaped record of any mark kind.
    pub(crate) fn add_mark(&mut self, kind: RecordKind, mark: Mark) -> AppendResult {
        self.check_sequence(kind)?;
        let record = DrawRecord::from_mark(kind, mark).ok_or(AppendError::OutOfSequence {
            kind,
            previous: self.last_kind(),
        })?;
        self.push(record);
        Ok(())
    }

    /// Undo the most recent operation.
    ///
    /// A freehand stroke (start, points, end) and a straight line (start,
    /// end) each count as one operation. An unfinished stroke is undone one
    /// record at a time.
    pub fn undo_last(&mut self) -> UndoOutcome {
        if self.count == 0 {
            return UndoOutcome::Empty;
        }
        let floor = self.floor();
        if self.count <= floor {
            log::debug!("Undo refused: log is locked at {floor} records");
            return UndoOutcome::LockFloor;
        }

        let before = self.count;
        match self.tombstone_last() {
            RecordKind::LineEnd => {
                while self.count > floor && self.last_kind() == Some(RecordKind::LinePoint) {
                    self.tombstone_last();
                }
                if self.count > floor && self.last_kind() == Some(RecordKind::LineStart) {
                    self.tombstone_last();
                }
            }
            RecordKind::StraightLineEnd => {
                if self.count > floor && self.last_kind() == Some(RecordKind::StraightLineStart) {
                    self.tombstone_last();
                }
            }
            _ => {}
        }
        UndoOutcome::Removed(before - self.count)
    }

    /// Lowest live count undo may reach.
    fn floor(&self) -> usize {
        if self.locked { self.lock_index } else { 0 }
    }

    /// Overwrite the last live slot with a tombstone, dropping whatever it
    /// owned, and return the kind it held.
    fn tombstone_last(&mut self) -> RecordKind {
        self.count -= 1;
        std::mem::take(&mut self.slots[self.count]).kind()
    }

    fn check_sequence(&self, kind: RecordKind) -> AppendResult {
        let previous = self.last_kind();
        let open = previous.is_some_and(RecordKind::opens_stroke);
        let allowed = match kind {
            RecordKind::LinePoint | RecordKind::LineEnd => matches!(
                previous,
                Some(RecordKind::LineStart) | Some(RecordKind::LinePoint)
            ),
            RecordKind::StraightLineEnd => previous == Some(RecordKind::StraightLineStart),
            RecordKind::NoDraw => false,
            _ => !open,
        };
        if allowed {
            Ok(())
        } else {
            log::warn!("Rejected {kind} after {}", describe_previous(previous));
            Err(AppendError::OutOfSequence { kind, previous })
        }
    }

    fn push(&mut self, record: DrawRecord) {
        if self.count == self.slots.len() {
            let capacity = self.slots.len() * 2;
            log::debug!("Growing operation log from {} to {capacity} slots", self.slots.len());
            self.slots.resize_with(capacity, DrawRecord::default);
        }
        self.slots[self.count] = record;
        self.count += 1;
    }

    /// Append without any sequencing check.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, record: DrawRecord) {
        self.push(record);
    }
}
