//! Top-level run: config, input, stores, transfer, JSON output.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use files_downloader::{FilesDownloader, HttpStorage, LocalStorage, Storage};
use tracing::{debug, info};

use crate::app::config_runtime::{self, RemoteSource, RunSettings};
use crate::app::input_processor;
use crate::app::progress_manager::ProgressUi;
use crate::app::terminal::{self, StderrCapabilities};
use crate::app_config;
use crate::cli::Args;

pub(crate) async fn run_files_downloader() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = app_config::load_config(args.config.as_deref())?;

    let default_level = config_runtime::resolve_default_log_level(&args, &loaded.config);
    let stderr = StderrCapabilities::detect();
    terminal::init_tracing(default_level, stderr.ansi(args.no_color));

    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "config file loaded");
    }

    let settings = config_runtime::resolve_settings(&args, &loaded.config)?;
    let bundle = input_processor::read_bundle(args.parameters.as_deref())?;

    let remote = build_remote(&settings)?;
    let local = Arc::new(LocalStorage::new(settings.local_root.clone()));

    info!(
        local_root = %settings.local_root.display(),
        remote = remote.backend(),
        "Files downloader starting"
    );

    let progress = ProgressUi::start(stderr, args.quiet);
    debug!(spinner = progress.has_spinner(), "progress UI ready");

    let downloader = FilesDownloader::new(local, remote, Arc::clone(&progress.sink))
        .with_options(settings.options);
    let outcome = downloader.invoke(&bundle).await;
    progress.finish();

    let result = outcome.with_context(|| format!("{} failed", downloader.name()))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn build_remote(settings: &RunSettings) -> Result<Arc<dyn Storage>> {
    match &settings.remote {
        RemoteSource::Directory(root) => Ok(Arc::new(LocalStorage::new(root.clone()))),
        RemoteSource::Url(url) => {
            let store = HttpStorage::with_timeouts(
                url,
                settings.http_timeouts.connect_secs,
                settings.http_timeouts.read_secs,
            )
            .with_context(|| format!("Invalid remote URL '{url}'"))?;
            Ok(Arc::new(store))
        }
    }
}
