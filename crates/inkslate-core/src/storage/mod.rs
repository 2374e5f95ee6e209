//! Board persistence.

mod codec;
mod memory;
mod path;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use codec::{decode_board, encode_board};
pub use memory::MemoryStorage;
pub use path::{relative_reference, resolve_reference};

#[cfg(not(target_arch = "wasm32"))]
pub use file::{FileStorage, load_board, save_board};

use crate::board::Whiteboard;
use crate::image::{ImageLoader, ResourceLoadError};
use std::io;
use thiserror::Error;

/// File extension used for stored boards.
pub const BOARD_EXTENSION: &str = "wbd";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Board not found: {0}")]
    NotFound(String),
    #[error("Malformed board data at byte {offset}: {reason}")]
    Malformed { offset: u64, reason: String },
    #[error("Board too large to encode: {0}")]
    TooLarge(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to reload embedded image: {0}")]
    ResourceLoad(#[from] ResourceLoadError),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Named board storage backends.
///
/// Loading needs an [`ImageLoader`] because image records carry decoded
/// pixels that are not part of the stored bytes.
pub trait Storage: Send + Sync {
    /// Save a board.
    fn save(&self, id: &str, board: &Whiteboard) -> StorageResult<()>;

    /// Load a board.
    fn load(&self, id: &str, loader: &dyn ImageLoader) -> StorageResult<Whiteboard>;

    /// Delete a board. Deleting a missing board is not an error.
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// List all board IDs.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a board exists.
    fn exists(&self, id: &str) -> StorageResult<bool>;
}
