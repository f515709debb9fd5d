//! Outcome of a successful transfer.

use serde::Serialize;

/// Local paths written by a transfer, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    paths: Vec<String>,
    bytes_written: u64,
}

impl TransferResult {
    /// Local paths written, in the relative order of the request's surviving files.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Consumes the result, returning the written paths.
    #[must_use]
    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    /// Total bytes written across all files.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of files written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no file was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub(crate) fn record(&mut self, path: String, bytes: u64) {
        self.paths.push(path);
        self.bytes_written = self.bytes_written.saturating_add(bytes);
    }
}
