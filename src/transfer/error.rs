//! Error types for the transfer module.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that abort a transfer.
///
/// The first error ends the whole call. Files copied before it are left in
/// place, so callers must treat the destination as indeterminate.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A required request field is absent or empty.
    #[error("missing required parameter `{field}`")]
    MissingParameter {
        /// Name of the missing field (`files` or `destination`).
        field: &'static str,
    },

    /// The parameter bundle is present but has the wrong shape.
    #[error("invalid transfer parameters: {source}")]
    InvalidParameters {
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A requested file is absent from the remote store.
    #[error("remote file {identifier} does not exist")]
    RemoteFileNotFound {
        /// The remote identifier as requested.
        identifier: String,
    },

    /// The local store refused to write a file.
    #[error("cannot write to {path}: {reason}")]
    WriteFailed {
        /// The local path that could not be written.
        path: String,
        /// Reason reported by the local store.
        reason: String,
    },

    /// Any other storage failure, propagated unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TransferError {
    /// Creates a missing-parameter error.
    #[must_use]
    pub fn missing_parameter(field: &'static str) -> Self {
        Self::MissingParameter { field }
    }

    /// Creates a remote-file-not-found error.
    pub fn remote_file_not_found(identifier: impl Into<String>) -> Self {
        Self::RemoteFileNotFound {
            identifier: identifier.into(),
        }
    }

    /// Creates a write-failed error.
    pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
