//! Storage capability for the stores files are copied between.
//!
//! A transfer talks to two stores: the remote store it reads from and the
//! local store it writes to. Both are reached only through the [`Storage`]
//! trait, so any backend satisfying it can be substituted.
//!
//! # Backends
//!
//! - [`LocalStorage`] - a directory on the local filesystem
//! - [`HttpStorage`] - a read-only remote store served over HTTP(S)
//! - [`MemoryStorage`] - an in-memory store that records every call
//!
//! # Example
//!
//! ```no_run
//! use files_downloader::storage::{LocalStorage, Storage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LocalStorage::new("/srv/exports");
//! if store.exists("reports/2024.csv").await? {
//!     println!("report is available");
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

mod error;
mod http;
mod local;
mod memory;

pub use error::StorageError;
pub use http::{CONNECT_TIMEOUT_SECS, HttpStorage, READ_TIMEOUT_SECS};
pub use local::LocalStorage;
pub use memory::{MemoryStorage, StorageCall};

/// Chunked byte stream produced by [`Storage::read_stream`].
///
/// Chunks are yielded as they arrive so that a whole file never has to be
/// held in memory.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, StorageError>> + Send>>;

/// Options passed through to [`Storage::create_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryOptions {
    /// Permission bits for created directories (unix only; `None` uses the umask default).
    pub mode: Option<u32>,
}

/// Options passed through to [`Storage::write_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file at the target path.
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// Result of a write that did not fail with an I/O error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// All bytes were written and flushed.
    Written {
        /// Number of bytes written.
        bytes: u64,
    },
    /// The store refused the write.
    Rejected {
        /// Why the store refused.
        reason: String,
    },
}

/// Minimal capability interface over a file store.
///
/// Paths are `/`-separated strings relative to the store root. Stores only
/// implement what they can serve: the default bodies of the mutating and
/// streaming operations return [`StorageError::Unsupported`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend label used in logs and errors.
    fn backend(&self) -> &'static str;

    /// Returns true if any entry (file or directory) exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Returns true if a directory exists at `path`.
    async fn directory_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Creates `path` and any missing parents.
    async fn create_directory(
        &self,
        path: &str,
        options: &DirectoryOptions,
    ) -> Result<(), StorageError> {
        let _ = (path, options);
        Err(StorageError::unsupported(self.backend(), "create_directory"))
    }

    /// Opens a chunked read of the file at `path`.
    async fn read_stream(&self, path: &str) -> Result<ByteStream, StorageError> {
        let _ = path;
        Err(StorageError::unsupported(self.backend(), "read_stream"))
    }

    /// Writes `stream` to `path`, consuming it chunk by chunk.
    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        options: &WriteOptions,
    ) -> Result<WriteOutcome, StorageError> {
        let _ = (path, stream, options);
        Err(StorageError::unsupported(self.backend(), "write_stream"))
    }
}

/// Normalizes a store path into its canonical `/`-joined form.
///
/// Empty and `.` segments are dropped, so `a//b`, `/a/b` and `a/./b` all
/// address `a/b`. The store root normalizes to the empty string.
///
/// # Errors
///
/// Returns [`StorageError::InvalidPath`] if the path contains a `..` segment.
pub fn normalize_path(path: &str) -> Result<String, StorageError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(StorageError::invalid_path(
                    path,
                    "parent directory segments are not allowed",
                ));
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}
