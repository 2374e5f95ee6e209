//! File-based storage for native platforms.

use super::codec::{decode_board, encode_board};
use super::{BOARD_EXTENSION, Storage, StorageError, StorageResult};
use crate::board::Whiteboard;
use crate::config::BoardConfig;
use crate::image::ImageLoader;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `board` to `path`.
///
/// The bytes go to a temporary file in the same directory which then
/// replaces `path`, so an existing file is never left half written.
pub fn save_board(board: &Whiteboard, path: &Path) -> StorageResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        encode_board(board, path, &mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    log::info!("Saved {} pages to {}", board.total_images(), path.display());
    Ok(())
}

/// Read a board from `path`, reloading every embedded image through
/// `loader`.
pub fn load_board(
    path: &Path,
    loader: &dyn ImageLoader,
    config: &BoardConfig,
) -> StorageResult<Whiteboard> {
    let file = File::open(path)?;
    let board = decode_board(BufReader::new(file), path, loader, config)?;
    log::info!("Loaded {} pages from {}", board.total_images(), path.display());
    Ok(board)
}

impl Whiteboard {
    /// Save to `path`. See [`save_board`].
    pub fn save_to(&self, path: &Path) -> StorageResult<()> {
        save_board(self, path)
    }

    /// Replace this board with the one stored at `path`.
    ///
    /// On error the board is left exactly as it was.
    pub fn load_from(&mut self, path: &Path, loader: &dyn ImageLoader) -> StorageResult<()> {
        match load_board(path, loader, self.config()) {
            Ok(board) => {
                *self = board;
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load {}: {e}", path.display());
                Err(e)
            }
        }
    }
}

/// Stores boards as `<id>.wbd` files in one directory.
pub struct FileStorage {
    /// Base directory for board storage.
    base_path: PathBuf,
    config: BoardConfig,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf, config: BoardConfig) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self { base_path, config })
    }

    /// Create file storage in the platform data directory, e.g.
    /// `~/.local/share/inkslate/boards/` on Linux.
    pub fn default_location(config: BoardConfig) -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Other("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkslate").join("boards"), config)
    }

    /// File path for a board ID.
    pub fn document_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.{BOARD_EXTENSION}"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, board: &Whiteboard) -> StorageResult<()> {
        save_board(board, &self.document_path(id))
    }

    fn load(&self, id: &str, loader: &dyn ImageLoader) -> StorageResult<Whiteboard> {
        let path = self.document_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        load_board(&path, loader, &self.config)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let path = self.document_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == BOARD_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> StorageResult<bool> {
        Ok(self.document_path(id).exists())
    }
}
