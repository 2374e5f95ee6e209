//! Application configuration.

use anyhow::Context;
use inkslate_core::BoardConfig;
use inkslate_render::ExportConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the CLI can be configured with, read from one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// `<config dir>/inkslate/config.json`, if the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inkslate").join("config.json"))
    }

    /// Load from `explicit` if given (it must exist), else from
    /// [`default_path`](Self::default_path) if that file exists, else
    /// defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    log::debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .board
            .validate()
            .with_context(|| format!("Invalid board settings in {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "board": { "initial_pages": 8 }, "export": { "width": 640, "load_system_fonts": false } }"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.board.initial_pages, 8);
        assert_eq!(config.board.page_capacity, BoardConfig::default().page_capacity);
        assert_eq!(config.export.width, 640);
        assert_eq!(config.export.height, 1080);
        assert!(!config.export.load_system_fonts);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_bad_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_oversized_board_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "board": { "page_capacity": 1000000000000 } }"#).unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Invalid board settings"));
    }
}
