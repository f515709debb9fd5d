//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Copy a batch of remote files into a local destination directory.
///
/// Reads a JSON parameter bundle of the form
/// `{"parameters": {"files": [...], "destination": "...", "exclude": {"name": [...], "path": [...]}}}`
/// from PARAMETERS or piped stdin, and prints the written local paths as JSON.
#[derive(Parser, Debug)]
#[command(name = "files-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// JSON parameter bundle file (reads stdin when omitted)
    #[arg(value_name = "PARAMETERS")]
    pub parameters: Option<PathBuf>,

    /// Root directory of the local store (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Root directory of the remote store
    #[arg(long, value_name = "DIR", conflicts_with = "remote_url")]
    pub remote_root: Option<PathBuf>,

    /// Base URL of an HTTP(S) remote store
    #[arg(long, value_name = "URL")]
    pub remote_url: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/files-downloader/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Permission bits for a created destination directory, in octal (e.g. 755)
    #[arg(long, value_name = "OCTAL", value_parser = parse_octal_mode)]
    pub directory_mode: Option<u32>,

    /// Fail instead of replacing files that already exist locally
    #[arg(long)]
    pub no_overwrite: bool,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

/// Parses unix permission bits written in octal, with or without a leading `0` or `0o`.
pub fn parse_octal_mode(raw: &str) -> Result<u32, String> {
    let digits = raw.trim();
    let digits = digits.strip_prefix("0o").unwrap_or(digits);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| format!("'{raw}' is not an octal permission mode"))?;
    if mode > 0o7777 {
        return Err(format!("'{raw}' is out of range (max 7777)"));
    }
    Ok(mode)
}
