//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "inkslate")]
#[command(about = "Inspect, edit and export inkslate whiteboard files")]
#[command(version)]
pub struct Cli {
    /// JSON config file (defaults to the platform config directory).
    #[arg(long, env = "INKSLATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding boards addressed by ID (defaults to the platform
    /// data directory).
    #[arg(long, env = "INKSLATE_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Every `board` argument is either a path to a `.wbd` file or the bare ID
/// of a board in the store.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an empty board.
    New {
        board: PathBuf,
        /// Number of pages.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print page count, record counts, titles and lock state.
    Info {
        board: PathBuf,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List the IDs of stored boards.
    List,
    /// Delete a board file or stored board.
    Delete { board: PathBuf },
    /// Write pages as PNG files named `page-<n>.png`.
    Export {
        board: PathBuf,
        out_dir: PathBuf,
        /// Only this page (1-based).
        #[arg(long)]
        page: Option<usize>,
    },
    /// Append a raster or SVG image to a page. The kind follows the file
    /// extension.
    AddImage {
        board: PathBuf,
        image: PathBuf,
        /// Target page (1-based).
        #[arg(long)]
        page: usize,
        #[arg(long, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, allow_hyphen_values = true)]
        y: i32,
        /// Display width; defaults to the image's own width.
        #[arg(long)]
        width: Option<i32>,
        /// Display height; defaults to the image's own height.
        #[arg(long)]
        height: Option<i32>,
    },
    /// Set a page title.
    Title {
        board: PathBuf,
        /// Target page (1-based).
        #[arg(long)]
        page: usize,
        title: String,
    },
    /// Undo the last operation on a page. A locked page keeps everything up
    /// to its lock point.
    Undo {
        board: PathBuf,
        /// Target page (1-based).
        #[arg(long)]
        page: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_image() {
        let cli = Cli::try_parse_from([
            "inkslate", "add-image", "b.wbd", "cat.png", "--page", "2", "--x", "-5", "--y", "7",
        ])
        .unwrap();
        match cli.command {
            Command::AddImage { page, x, y, width, .. } => {
                assert_eq!((page, x, y, width), (2, -5, 7, None));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["inkslate", "info", "b.wbd", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn test_store_flag_and_list() {
        let cli = Cli::try_parse_from(["inkslate", "--store", "/tmp/boards", "list"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/boards")));
        assert!(matches!(cli.command, Command::List));
    }
}
