pub mod cli;
pub mod dates;
pub mod db;
pub mod metrics;
pub mod models;
pub mod revisions;
pub mod settings;
pub mod tracker;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use db::Database;
use settings::SettingsStore;
use tracker::StudyTracker;

const ENABLE_LOGS: bool = true;

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => dirs::data_dir()
            .map(|dir| dir.join("studytrack"))
            .context("could not determine a data directory; pass --data-dir"),
    }
}

fn default_log_level() -> log::LevelFilter {
    match std::env::var("STUDYTRACK_DEBUG").as_deref() {
        Ok("1") | Ok("true") => log::LevelFilter::Debug,
        _ => log::LevelFilter::Warn,
    }
}

pub fn run() -> Result<()> {
    // RUST_LOG wins over the default level
    env_logger::Builder::new()
        .filter_level(default_log_level())
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let dir = data_dir(&cli)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let database = Database::new(dir.join("studytrack.sqlite3"))?;
        let settings = SettingsStore::new(dir.join("settings.json"))?;
        let tracker = StudyTracker::open(database, settings).await?;
        crate::log_debug!("Opened study tracker in {}", dir.display());

        cli::dispatch(&tracker, cli.command, cli.format).await
    })
}
