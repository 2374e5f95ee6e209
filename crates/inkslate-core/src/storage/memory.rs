//! In-memory storage implementation.

use super::codec::{decode_board, encode_board};
use super::{BOARD_EXTENSION, Storage, StorageError, StorageResult};
use crate::board::Whiteboard;
use crate::config::BoardConfig;
use crate::image::ImageLoader;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
///
/// Boards are kept encoded, exactly as they would be written to disk, under
/// a virtual directory that image references are made relative to.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    base_path: PathBuf,
    config: BoardConfig,
}

impl MemoryStorage {
    /// Create a new empty memory storage rooted at the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage whose boards behave as if saved under `base_path`.
    pub fn with_base_path(base_path: PathBuf, config: BoardConfig) -> Self {
        Self {
            documents: RwLock::default(),
            base_path,
            config,
        }
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{id}.{BOARD_EXTENSION}"))
    }

    /// Encoded size of a stored board.
    pub fn stored_len(&self, id: &str) -> StorageResult<Option<usize>> {
        let docs = self.documents.read().map_err(lock_error)?;
        Ok(docs.get(id).map(Vec::len))
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, board: &Whiteboard) -> StorageResult<()> {
        let mut bytes = Vec::new();
        encode_board(board, &self.document_path(id), &mut bytes)?;
        let mut docs = self.documents.write().map_err(lock_error)?;
        docs.insert(id.to_string(), bytes);
        Ok(())
    }

    fn load(&self, id: &str, loader: &dyn ImageLoader) -> StorageResult<Whiteboard> {
        let docs = self.documents.read().map_err(lock_error)?;
        let bytes = docs
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        decode_board(bytes.as_slice(), &self.document_path(id), loader, &self.config)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let mut docs = self.documents.write().map_err(lock_error)?;
        docs.remove(id);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let docs = self.documents.read().map_err(lock_error)?;
        let mut ids: Vec<String> = docs.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let docs = self.documents.read().map_err(lock_error)?;
        Ok(docs.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::testing::FakeLoader;
    use crate::record::{Colour, DrawRecord};
    use std::path::Path;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let mut board = Whiteboard::new();
        board.change_image_title("Only");
        board
            .current_page_mut()
            .add_text("hi", 1, 2, Colour::BLACK, 12, 0)
            .unwrap();

        storage.save("test", &board).unwrap();
        let loaded = storage.load("test", &FakeLoader::default()).unwrap();
        assert_eq!(loaded.image_title_current(), "Only");
        assert_eq!(loaded.current_page().records(), board.current_page().records());
        assert!(storage.stored_len("test").unwrap().unwrap() > 0);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = storage.load("nonexistent", &FakeLoader::default());
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert_eq!(storage.stored_len("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_list_exists_delete() {
        let storage = MemoryStorage::new();
        storage.save("two", &Whiteboard::new()).unwrap();
        storage.save("one", &Whiteboard::new()).unwrap();
        assert_eq!(storage.list().unwrap(), vec!["one".to_string(), "two".to_string()]);
        assert!(storage.exists("one").unwrap());
        storage.delete("one").unwrap();
        assert!(!storage.exists("one").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_images_relative_to_base_path() {
        let storage =
            MemoryStorage::with_base_path(PathBuf::from("/boards"), BoardConfig::default());
        let loader = FakeLoader::default();
        let mut board = Whiteboard::new();
        board
            .current_page_mut()
            .add_svg_image(&loader, Path::new("/boards/art/logo.svg"), 0, 0, 8, 8)
            .unwrap();
        storage.save("b", &board).unwrap();

        let loaded = storage.load("b", &loader).unwrap();
        match &loaded.current_page().records()[0] {
            DrawRecord::SvgImage(img) => {
                assert_eq!(img.filename, PathBuf::from("/boards/art/logo.svg"))
            }
            other => panic!("unexpected record {other:?}"),
        }
    }
}
