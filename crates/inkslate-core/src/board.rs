//! The whiteboard: an ordered collection of pages.
//!
//! Page slots are pre-allocated. Slots at and past `total` hold empty spare
//! logs, so inserting a page recycles a spare instead of building one, and
//! deleting a page resets it and hands it back to the spare pool.

use crate::config::BoardConfig;
use crate::operations::{OperationLog, determine_capacity};
use thiserror::Error;

/// Renders a page's live records onto a fresh surface.
pub trait PageRenderer {
    type Surface;
    type Error: std::error::Error + 'static;

    fn render_page(&self, page: &OperationLog) -> Result<Self::Surface, Self::Error>;
}

/// Errors from [`Whiteboard::export_board`].
#[derive(Debug, Error)]
pub enum ExportError<E: std::error::Error + 'static> {
    #[error("Page {index} does not exist (board has {total} pages)")]
    NoSuchPage { index: usize, total: usize },
    #[error(transparent)]
    Render(E),
}

/// Ordered pages plus the current-page cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Whiteboard {
    /// All slots; `pages.len()` is the slot capacity.
    pages: Vec<OperationLog>,
    current: usize,
    total: usize,
    config: BoardConfig,
}

impl Default for Whiteboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Whiteboard {
    /// A board with one empty page and the default slot counts.
    pub fn new() -> Self {
        Self::with_config(&BoardConfig::default())
    }

    /// A board with one empty page, sized according to `config`.
    ///
    /// Sizes outside the accepted range are clamped.
    pub fn with_config(config: &BoardConfig) -> Self {
        let config = &config.clamped();
        let pages = (0..config.initial_pages)
            .map(|_| OperationLog::with_capacity(config.page_capacity))
            .collect();
        Self {
            pages,
            current: 0,
            total: 1,
            config: config.clone(),
        }
    }

    /// Sizing this board was created with.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Build a board from already populated pages (typically freshly
    /// decoded). Spare slots are added so that the slot count is the
    /// smallest doubling of `config.initial_pages` above the page count.
    ///
    /// An empty `pages` yields a single empty page.
    pub fn from_pages(pages: Vec<OperationLog>, config: &BoardConfig) -> Self {
        let mut board = Self::with_config(config);
        board.set_pages(pages);
        board
    }

    /// Replace every page wholesale and move the cursor to the first page.
    pub fn set_pages(&mut self, mut pages: Vec<OperationLog>) {
        let page_capacity = self.config.page_capacity;
        if pages.is_empty() {
            pages.push(OperationLog::with_capacity(page_capacity));
        }
        let total = pages.len();
        let slots = determine_capacity(total, self.config.initial_pages);
        pages.resize_with(slots, || OperationLog::with_capacity(page_capacity));
        log::debug!("Whiteboard replaced: {total} pages in {slots} slots");
        self.pages = pages;
        self.total = total;
        self.current = 0;
    }

    /// Back to a single empty page.
    pub fn reset(&mut self) {
        for page in &mut self.pages[..self.total] {
            page.reset();
        }
        self.total = 1;
        self.current = 0;
    }

    /// Number of live pages.
    pub fn total_images(&self) -> usize {
        self.total
    }

    /// Number of page slots, live and spare.
    pub fn max_images(&self) -> usize {
        self.pages.len()
    }

    /// Current page number, 1-based.
    pub fn current_image(&self) -> usize {
        self.current + 1
    }

    /// Current page index, 0-based.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Live pages in order.
    pub fn pages(&self) -> &[OperationLog] {
        &self.pages[..self.total]
    }

    /// Live page `index` (0-based).
    pub fn page(&self, index: usize) -> Option<&OperationLog> {
        self.pages().get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut OperationLog> {
        self.pages[..self.total].get_mut(index)
    }

    pub fn current_page(&self) -> &OperationLog {
        &self.pages[self.current]
    }

    pub fn current_page_mut(&mut self) -> &mut OperationLog {
        &mut self.pages[self.current]
    }

    /// Insert an empty page right after the current one and move to it.
    pub fn add_new_image(&mut self) {
        if self.total == self.pages.len() {
            let slots = self.pages.len() * 2;
            log::debug!("Growing whiteboard from {} to {slots} page slots", self.pages.len());
            let page_capacity = self.config.page_capacity;
            self.pages
                .resize_with(slots, || OperationLog::with_capacity(page_capacity));
        }
        // The spare at `total` moves to `current + 1`; pages after the cursor
        // shift one slot right.
        self.pages[self.current + 1..=self.total].rotate_right(1);
        self.current += 1;
        self.total += 1;
    }

    /// Delete the current page. Refused (returns `false`) when it is the only
    /// page.
    pub fn delete_image(&mut self) -> bool {
        if self.total == 1 {
            return false;
        }
        self.pages[self.current].reset();
        // The reset page moves to the end of the live range, which then
        // becomes the first spare slot.
        self.pages[self.current..self.total].rotate_left(1);
        self.total -= 1;
        if self.current >= self.total {
            self.current = self.total - 1;
        }
        true
    }

    /// Move to 1-based page `number`. Out-of-range numbers are ignored and
    /// reported with `false`.
    pub fn change_image(&mut self, number: usize) -> bool {
        if number == 0 || number > self.total {
            return false;
        }
        self.current = number - 1;
        true
    }

    /// Move to the next page if there is one.
    pub fn advance_image(&mut self) -> bool {
        self.change_image(self.current_image() + 1)
    }

    /// Move to the previous page if there is one.
    pub fn go_back_image(&mut self) -> bool {
        self.current > 0 && self.change_image(self.current)
    }

    pub fn image_title_current(&self) -> &str {
        self.current_page().title()
    }

    pub fn change_image_title(&mut self, title: impl Into<String>) {
        self.current_page_mut().set_title(title);
    }

    pub fn image_locked(&self) -> bool {
        self.current_page().is_locked()
    }

    pub fn lock_image(&mut self) {
        self.current_page_mut().lock();
    }

    pub fn unlock_image(&mut self) {
        self.current_page_mut().unlock();
    }

    /// Render live page `index` (0-based). The cursor is not touched.
    pub fn export_board<R: PageRenderer>(
        &self,
        index: usize,
        renderer: &R,
    ) -> Result<R::Surface, ExportError<R::Error>> {
        let page = self.page(index).ok_or(ExportError::NoSuchPage {
            index,
            total: self.total,
        })?;
        renderer.render_page(page).map_err(ExportError::Render)
    }
}
