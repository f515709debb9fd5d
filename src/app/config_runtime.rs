//! Merges CLI flags over file config into the settings a run uses.

use std::path::PathBuf;

use anyhow::{Result, bail};
use files_downloader::{DirectoryOptions, TransferOptions, WriteOptions};
use files_downloader::storage::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Where files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteSource {
    Directory(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HttpTimeoutSettings {
    pub(crate) connect_secs: u64,
    pub(crate) read_secs: u64,
}

impl Default for HttpTimeoutSettings {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSettings {
    pub(crate) local_root: PathBuf,
    pub(crate) remote: RemoteSource,
    pub(crate) options: TransferOptions,
    pub(crate) http_timeouts: HttpTimeoutSettings,
}

/// Applies CLI flags over `file_config`; CLI values win.
pub(crate) fn resolve_settings(args: &Args, file_config: &FileConfig) -> Result<RunSettings> {
    let local_root = args
        .local_root
        .clone()
        .or_else(|| file_config.local_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let remote = match (&args.remote_root, &args.remote_url) {
        (Some(root), _) => RemoteSource::Directory(root.clone()),
        (None, Some(url)) => RemoteSource::Url(url.clone()),
        (None, None) => match (&file_config.remote_root, &file_config.remote_url) {
            (Some(root), _) => RemoteSource::Directory(root.clone()),
            (None, Some(url)) => RemoteSource::Url(url.clone()),
            (None, None) => bail!(
                "No remote store configured. Pass --remote-root or --remote-url, \
                 or set `remote_root`/`remote_url` in the config file."
            ),
        },
    };

    let overwrite = if args.no_overwrite {
        false
    } else {
        file_config.overwrite.unwrap_or(true)
    };

    let defaults = HttpTimeoutSettings::default();
    let http_timeouts = HttpTimeoutSettings {
        connect_secs: args
            .connect_timeout
            .or(file_config.connect_timeout_secs)
            .unwrap_or(defaults.connect_secs),
        read_secs: args
            .read_timeout
            .or(file_config.read_timeout_secs)
            .unwrap_or(defaults.read_secs),
    };

    Ok(RunSettings {
        local_root,
        remote,
        options: TransferOptions {
            directory: DirectoryOptions {
                mode: args.directory_mode.or(file_config.directory_mode),
            },
            write: WriteOptions { overwrite },
        },
        http_timeouts,
    })
}

/// Default log level. Priority: quiet flag > verbose flag > config verbosity > info.
///
/// `RUST_LOG` still overrides whatever this returns.
pub(crate) fn resolve_default_log_level(args: &Args, file_config: &FileConfig) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => file_config
            .verbosity
            .map_or("info", crate::app_config::VerbositySetting::log_level),
        1 => "debug",
        _ => "trace",
    }
}
