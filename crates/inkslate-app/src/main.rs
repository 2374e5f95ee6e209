//! Command-line entry point.

use anyhow::Context;
use clap::Parser;
use inkslate_app::{AppConfig, Cli};
use inkslate_core::FileStorage;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::info!("Starting inkslate: {:?}", cli.command);

    let config = AppConfig::load(cli.config.as_deref())?;
    let store = match cli.store {
        Some(dir) => FileStorage::new(dir, config.board.clone()),
        None => FileStorage::default_location(config.board.clone()),
    }
    .context("Failed to open the board store")?;
    log::debug!("Board store at {}", store.base_path().display());

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = inkslate_app::run(cli.command, &config, &store, &mut stdout) {
        log::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
