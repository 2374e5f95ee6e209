//! Inkslate command-line shell.
//!
//! Argument parsing, configuration loading and the commands the `inkslate`
//! binary runs.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Command};
pub use commands::{BoardInfo, BoardRef, PageInfo, run};
pub use config::AppConfig;
