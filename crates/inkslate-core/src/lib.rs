//! Inkslate Core Library
//!
//! Drawing history, page management and the board file format for the
//! inkslate whiteboard. Rendering lives in `inkslate-render`.

pub mod board;
pub mod config;
pub mod image;
pub mod operations;
pub mod record;
pub mod storage;

pub use board::{ExportError, PageRenderer, Whiteboard};
pub use config::{
    BoardConfig, ConfigError, DEFAULT_INITIAL_PAGES, MAX_INITIAL_PAGES, MAX_PAGE_CAPACITY,
};
pub use image::{DecodedImage, ImageKind, ImageLoader, ResourceLoadError};
pub use operations::{
    AppendError, AppendResult, DEFAULT_PAGE_CAPACITY, OperationLog, UndoOutcome, determine_capacity,
};
pub use record::{Colour, DrawRecord, ImageRecord, Mark, RecordKind, TextRecord};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
