//! Error types for the storage module.
//!
//! Every variant carries the path or URL it concerns so failures surfaced by a
//! transfer point at the exact entry that broke.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Storage`](super::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File system error (metadata, open, read, write, create dir).
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file system path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The store path cannot be resolved inside the store root.
    #[error("invalid store path {path}: {reason}")]
    InvalidPath {
        /// The offending path as given.
        path: String,
        /// Why the path was refused.
        reason: &'static str,
    },

    /// The remote base URL or a derived URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response other than "not found".
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The backend does not provide this capability.
    #[error("{backend} storage does not support {operation}")]
    Unsupported {
        /// Backend label.
        backend: &'static str,
        /// Name of the refused operation.
        operation: &'static str,
    },
}

impl StorageError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network error, promoting timeouts to [`StorageError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }
}

// No From<std::io::Error> / From<reqwest::Error>: every variant needs the path
// or URL, which the source errors do not carry.
