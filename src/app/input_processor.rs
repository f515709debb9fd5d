//! Loads the JSON parameter bundle from a file or piped stdin.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Reads the bundle from `parameters_file`, or from stdin when it is piped.
pub(crate) fn read_bundle(parameters_file: Option<&Path>) -> Result<Value> {
    if let Some(path) = parameters_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters file '{}'", path.display()))?;
        return parse_bundle_text(&raw)
            .with_context(|| format!("Invalid parameters file '{}'", path.display()));
    }

    if io::stdin().is_terminal() {
        bail!(
            "No parameters provided. Pass a JSON file or pipe one via stdin.\n  \
             Example: echo '{{\"parameters\": {{\"files\": [\"a.txt\"], \"destination\": \"inbox\"}}}}' \
             | files-downloader --remote-root /mnt/share"
        );
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read parameters from stdin")?;
    parse_bundle_text(&buffer).context("Invalid parameters on stdin")
}

pub(crate) fn parse_bundle_text(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        bail!("parameter bundle is empty");
    }
    let bundle: Value = serde_json::from_str(raw).context("parameter bundle is not valid JSON")?;
    if !bundle.is_object() {
        bail!("parameter bundle must be a JSON object");
    }
    Ok(bundle)
}
