//! Command implementations.
//!
//! Mutating commands load the board, apply one change, and save it back.
//! Saves replace the file atomically.

use crate::cli::Command;
use crate::config::AppConfig;
use anyhow::{Context, bail};
use inkslate_core::storage::{BOARD_EXTENSION, load_board, save_board};
use inkslate_core::{
    DecodedImage, ImageKind, ImageLoader, OperationLog, ResourceLoadError, Storage, UndoOutcome,
    Whiteboard,
};
use inkslate_render::{FileImageLoader, Rasterizer, encode_png};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a board argument points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardRef {
    /// A board file anywhere on disk.
    File(PathBuf),
    /// A board kept in the store under this ID.
    Stored(String),
}

impl BoardRef {
    /// A bare name without directories or the board extension is a store
    /// ID. Anything else is a file path.
    pub fn parse(arg: &Path) -> Self {
        let is_file = arg.extension().is_some_and(|e| e == BOARD_EXTENSION)
            || arg.components().count() != 1;
        match arg.to_str() {
            Some(id) if !is_file => Self::Stored(id.to_string()),
            _ => Self::File(arg.to_path_buf()),
        }
    }
}

impl fmt::Display for BoardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stored(id) => write!(f, "board '{id}'"),
        }
    }
}

/// Summary of one page for `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub number: usize,
    pub title: String,
    pub records: usize,
    pub locked: bool,
    pub lock_index: usize,
}

/// Summary of a board for `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardInfo {
    pub pages: Vec<PageInfo>,
    pub page_slots: usize,
}

impl BoardInfo {
    pub fn of(board: &Whiteboard) -> Self {
        let pages = board
            .pages()
            .iter()
            .enumerate()
            .map(|(i, page)| PageInfo {
                number: i + 1,
                title: page.title().to_string(),
                records: page.len(),
                locked: page.is_locked(),
                lock_index: page.lock_index(),
            })
            .collect();
        Self {
            pages,
            page_slots: board.max_images(),
        }
    }
}

/// Run one command, writing user-facing output to `out`. Board IDs are
/// looked up in `store`.
pub fn run(
    command: Command,
    config: &AppConfig,
    store: &dyn Storage,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::New { board, pages } => {
            let target = BoardRef::parse(&board);
            new_board(&target, pages, config, store)?;
            writeln!(out, "Created {target} with {pages} page(s)")?;
        }
        Command::Info { board, json } => {
            let info = BoardInfo::of(&open(&BoardRef::parse(&board), config, store)?);
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
            } else {
                print_info(&info, out)?;
            }
        }
        Command::List => {
            for id in store.list().context("Failed to list stored boards")? {
                writeln!(out, "{id}")?;
            }
        }
        Command::Delete { board } => {
            let target = BoardRef::parse(&board);
            delete(&target, store)?;
            writeln!(out, "Deleted {target}")?;
        }
        Command::Export { board, out_dir, page } => {
            let wb = open(&BoardRef::parse(&board), config, store)?;
            for path in export(&wb, &out_dir, page, config)? {
                writeln!(out, "{}", path.display())?;
            }
        }
        Command::AddImage {
            board,
            image,
            page,
            x,
            y,
            width,
            height,
        } => {
            let target = BoardRef::parse(&board);
            let mut wb = open(&target, config, store)?;
            add_image(&mut wb, page, &image, x, y, width, height)?;
            save(&wb, &target, store)?;
            writeln!(out, "Added {} to page {page}", image.display())?;
        }
        Command::Title { board, page, title } => {
            let target = BoardRef::parse(&board);
            let mut wb = open(&target, config, store)?;
            page_mut(&mut wb, page)?.set_title(title.as_str());
            save(&wb, &target, store)?;
            writeln!(out, "Page {page} is now \"{title}\"")?;
        }
        Command::Undo { board, page } => {
            let target = BoardRef::parse(&board);
            let mut wb = open(&target, config, store)?;
            let outcome = page_mut(&mut wb, page)?.undo_last();
            match outcome {
                UndoOutcome::Removed(n) => {
                    save(&wb, &target, store)?;
                    writeln!(out, "Removed {n} record(s) from page {page}")?;
                }
                UndoOutcome::Empty => writeln!(out, "Page {page} has nothing to undo")?,
                UndoOutcome::LockFloor => writeln!(out, "Page {page} is locked")?,
            }
        }
    }
    Ok(())
}

fn open(target: &BoardRef, config: &AppConfig, store: &dyn Storage) -> anyhow::Result<Whiteboard> {
    let loader = FileImageLoader::new();
    let board = match target {
        BoardRef::File(path) => load_board(path, &loader, &config.board),
        BoardRef::Stored(id) => store.load(id, &loader),
    };
    board.with_context(|| format!("Failed to load {target}"))
}

fn save(board: &Whiteboard, target: &BoardRef, store: &dyn Storage) -> anyhow::Result<()> {
    let saved = match target {
        BoardRef::File(path) => save_board(board, path),
        BoardRef::Stored(id) => store.save(id, board),
    };
    saved.with_context(|| format!("Failed to save {target}"))
}

fn delete(target: &BoardRef, store: &dyn Storage) -> anyhow::Result<()> {
    match target {
        BoardRef::File(path) => std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete {}", path.display())),
        BoardRef::Stored(id) => {
            if !store.exists(id)? {
                bail!("No stored board named '{id}'");
            }
            store
                .delete(id)
                .with_context(|| format!("Failed to delete {target}"))
        }
    }
}

fn page_mut(board: &mut Whiteboard, number: usize) -> anyhow::Result<&mut OperationLog> {
    let total = board.total_images();
    if number == 0 || number > total {
        bail!("Page {number} does not exist (board has {total} pages)");
    }
    board
        .page_mut(number - 1)
        .with_context(|| format!("Page {number} does not exist"))
}

/// Create a board with `pages` empty pages and save it to `target`.
pub fn new_board(
    target: &BoardRef,
    pages: usize,
    config: &AppConfig,
    store: &dyn Storage,
) -> anyhow::Result<Whiteboard> {
    if pages == 0 {
        bail!("A board needs at least one page");
    }
    let mut board = Whiteboard::with_config(&config.board);
    for _ in 1..pages {
        board.add_new_image();
    }
    board.change_image(1);
    save(&board, target, store)?;
    Ok(board)
}

fn print_info(info: &BoardInfo, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{} page(s), {} slot(s)", info.pages.len(), info.page_slots)?;
    for page in &info.pages {
        let title = if page.title.is_empty() { "(untitled)" } else { page.title.as_str() };
        write!(out, "  {:>3}  {title}  {} record(s)", page.number, page.records)?;
        if page.locked {
            write!(out, ", locked at {}", page.lock_index)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Render pages to `page-<n>.png` files in `out_dir`. Renders every page
/// unless `only` names one (1-based).
pub fn export(
    board: &Whiteboard,
    out_dir: &Path,
    only: Option<usize>,
    config: &AppConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    let numbers: Vec<usize> = match only {
        Some(n) if n == 0 || n > board.total_images() => {
            bail!("Page {n} does not exist (board has {} pages)", board.total_images())
        }
        Some(n) => vec![n],
        None => (1..=board.total_images()).collect(),
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let rasterizer = Rasterizer::new(config.export.clone());

    let mut written = Vec::with_capacity(numbers.len());
    for number in numbers {
        let pixmap = board
            .export_board(number - 1, &rasterizer)
            .with_context(|| format!("Failed to render page {number}"))?;
        let png_data = encode_png(&pixmap)?;
        let path = out_dir.join(format!("page-{number}.png"));
        std::fs::write(&path, &png_data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Exported page {number} to {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Hands out an image that was already decoded.
struct Preloaded(DecodedImage);

impl ImageLoader for Preloaded {
    fn load_raster(&self, _path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        Ok(self.0.clone())
    }

    fn load_svg(&self, _path: &Path) -> Result<DecodedImage, ResourceLoadError> {
        Ok(self.0.clone())
    }
}

/// Decode `image` and append it to page `number` (1-based). Missing
/// dimensions default to the decoded image's size.
pub fn add_image(
    board: &mut Whiteboard,
    number: usize,
    image: &Path,
    x: i32,
    y: i32,
    width: Option<i32>,
    height: Option<i32>,
) -> anyhow::Result<()> {
    let kind = ImageKind::from_path(image);
    let decoded = FileImageLoader::new()
        .load(kind, image)
        .with_context(|| format!("Failed to load {}", image.display()))?;
    let width = width.unwrap_or_else(|| i32::try_from(decoded.width()).unwrap_or(i32::MAX));
    let height = height.unwrap_or_else(|| i32::try_from(decoded.height()).unwrap_or(i32::MAX));

    let loader = Preloaded(decoded);
    let page = page_mut(board, number)?;
    let appended = match kind {
        ImageKind::Raster => page.add_raster_image(&loader, image, x, y, width, height),
        ImageKind::Svg => page.add_svg_image(&loader, image, x, y, width, height),
    };
    appended.with_context(|| format!("Cannot add image to page {number}"))
}
