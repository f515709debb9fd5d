//! CLI entry point for the files downloader.

use anyhow::Result;

mod app;
mod app_config;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    app::runtime::run_files_downloader().await
}
