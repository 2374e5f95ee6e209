//! Board sizing configuration.

use crate::operations::DEFAULT_PAGE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of page slots allocated for a new board.
pub const DEFAULT_INITIAL_PAGES: usize = 4;

/// Largest accepted `page_capacity`. Logs still grow past it by appending.
pub const MAX_PAGE_CAPACITY: usize = 1 << 16;

/// Largest accepted `initial_pages`.
pub const MAX_INITIAL_PAGES: usize = 64;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be between 1 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

/// How new boards and pages are sized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Record slots in a fresh page.
    pub page_capacity: usize,
    /// Page slots allocated for a fresh board.
    pub initial_pages: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_capacity: DEFAULT_PAGE_CAPACITY,
            initial_pages: DEFAULT_INITIAL_PAGES,
        }
    }
}

impl BoardConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// Does not check ranges; see [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes that would pre-allocate unreasonable amounts of memory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("page_capacity", self.page_capacity, MAX_PAGE_CAPACITY)?;
        check_range("initial_pages", self.initial_pages, MAX_INITIAL_PAGES)
    }

    /// The same config with both sizes pulled into their accepted range.
    pub fn clamped(&self) -> Self {
        Self {
            page_capacity: self.page_capacity.clamp(1, MAX_PAGE_CAPACITY),
            initial_pages: self.initial_pages.clamp(1, MAX_INITIAL_PAGES),
        }
    }
}

fn check_range(field: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!(config.page_capacity, 1024);
        assert_eq!(config.initial_pages, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BoardConfig::from_json(r#"{ "page_capacity": 64 }"#).unwrap();
        assert_eq!(config.page_capacity, 64);
        assert_eq!(config.initial_pages, DEFAULT_INITIAL_PAGES);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(BoardConfig::load(&missing), Err(ConfigError::Read { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(matches!(BoardConfig::load(&bad), Err(ConfigError::Parse { .. })));

        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{ "initial_pages": 1 }"#).unwrap();
        assert_eq!(BoardConfig::load(&good).unwrap().initial_pages, 1);
    }

    #[test]
    fn test_oversized_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let huge = dir.path().join("huge.json");
        std::fs::write(&huge, r#"{ "page_capacity": 1000000000000 }"#).unwrap();
        assert!(matches!(
            BoardConfig::load(&huge),
            Err(ConfigError::OutOfRange { field: "page_capacity", .. })
        ));

        let zero = BoardConfig {
            initial_pages: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        assert!(BoardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clamped() {
        let config = BoardConfig {
            page_capacity: usize::MAX,
            initial_pages: 0,
        }
        .clamped();
        assert_eq!(config.page_capacity, MAX_PAGE_CAPACITY);
        assert_eq!(config.initial_pages, 1);
        assert!(config.validate().is_ok());
    }
}
