//! Image references stored relative to the board file.
//!
//! A board and the images it embeds can be moved together: image paths are
//! written relative to the directory holding the board and resolved against
//! the board's new location on load. References always use `/` separators
//! on disk and must be valid UTF-8.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the working directory and fold away `.` and
/// `..` components lexically.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Directory containing `document`.
fn document_dir(document: &Path) -> PathBuf {
    let document = absolute(document);
    document
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(document)
}

/// Reference to `image` as seen from the directory holding `document`.
///
/// Falls back to the absolute image path when the two share no root.
/// Returns `None` if the reference would not be valid UTF-8.
pub fn relative_reference(document: &Path, image: &Path) -> Option<String> {
    let base_dir = document_dir(document);
    let target = absolute(image);

    let base: Vec<Component<'_>> = base_dir.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();
    if base.first() != target_parts.first() {
        return target.to_str().map(str::to_owned);
    }

    let shared = base
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; base.len() - shared];
    for part in &target_parts[shared..] {
        segments.push(part.as_os_str().to_str()?);
    }
    if segments.is_empty() {
        return Some(".".to_string());
    }
    Some(segments.join("/"))
}

/// Separators accepted in a stored reference. A backslash is an ordinary
/// file name character on Unix.
#[cfg(windows)]
const SEPARATORS: &[char] = &['/', '\\'];
#[cfg(not(windows))]
const SEPARATORS: &[char] = &['/'];

/// Absolute path of a stored reference, given where the board now lives.
pub fn resolve_reference(document: &Path, stored: &str) -> PathBuf {
    let stored_path = Path::new(stored);
    if stored_path.is_absolute() {
        return normalize(stored_path);
    }

    let mut resolved = document_dir(document);
    for segment in stored.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            name => resolved.push(name),
        }
    }
    resolved
}
