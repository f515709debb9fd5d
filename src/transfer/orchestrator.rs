//! The files downloader: validates a request, filters it, and streams each
//! surviving file from the remote store to the local store.
//!
//! # Overview
//!
//! A call runs strictly in sequence:
//!
//! 1. Validate the request (no I/O before this passes)
//! 2. Ensure the destination directory exists on the local store
//! 3. Build the [`TransferPlan`] (exclusions never touch the remote store)
//! 4. For each planned file: check it exists remotely, then stream it across
//!
//! The first error aborts the call. Files already copied stay where they are.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use files_downloader::{FilesDownloader, LocalStorage, TracingProgress, TransferRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = FilesDownloader::new(
//!     Arc::new(LocalStorage::new("/var/pipeline")),
//!     Arc::new(LocalStorage::new("/mnt/exports")),
//!     Arc::new(TracingProgress),
//! );
//! let request = TransferRequest::new(["reports/q1.csv"], "inbox").exclude_names(["draft.csv"]);
//! let result = downloader.transfer(&request).await?;
//! println!("wrote {:?}", result.paths());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{PlannedTransfer, TransferError, TransferPlan, TransferRequest, TransferResult};
use crate::progress::ProgressSink;
use crate::storage::{DirectoryOptions, Storage, WriteOptions, WriteOutcome};

/// Options handed through to the local store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Used when the destination directory has to be created.
    pub directory: DirectoryOptions,
    /// Used for every file write.
    pub write: WriteOptions,
}

/// Copies requested files from a remote store into a local destination.
///
/// Holds no per-call state; one instance can serve any number of calls.
pub struct FilesDownloader {
    local: Arc<dyn Storage>,
    remote: Arc<dyn Storage>,
    progress: Arc<dyn ProgressSink>,
    options: TransferOptions,
}

impl std::fmt::Debug for FilesDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesDownloader")
            .field("local", &self.local.backend())
            .field("remote", &self.remote.backend())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl FilesDownloader {
    /// Human-readable step name reported to the pipeline.
    pub const NAME: &'static str = "Files downloader";

    /// Creates a downloader with default options.
    #[must_use]
    pub fn new(
        local: Arc<dyn Storage>,
        remote: Arc<dyn Storage>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            local,
            remote,
            progress,
            options: TransferOptions::default(),
        }
    }

    /// Replaces the options passed to the local store.
    #[must_use]
    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the step name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Parses a harness bundle and runs the transfer.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidParameters`] for a malformed bundle,
    /// otherwise any error of [`FilesDownloader::transfer`].
    pub async fn invoke(&self, bundle: &Value) -> Result<TransferResult, TransferError> {
        let request = TransferRequest::from_bundle(bundle)?;
        self.transfer(&request).await
    }

    /// Copies every non-excluded file of `request` into its destination.
    ///
    /// # Errors
    ///
    /// - [`TransferError::MissingParameter`] if `files` or `destination` is empty
    /// - [`TransferError::RemoteFileNotFound`] for the first planned file absent remotely
    /// - [`TransferError::WriteFailed`] if the local store refuses a write
    /// - [`TransferError::Storage`] for any other store failure
    #[instrument(
        skip(self, request),
        fields(files = request.files.len(), destination = %request.destination)
    )]
    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferResult, TransferError> {
        request.validate()?;

        self.ensure_destination(&request.destination).await?;

        let plan = TransferPlan::build(request);
        for skipped in plan.skipped() {
            debug!(file = %skipped.identifier, reason = %skipped.reason, "excluded");
            self.progress.emit(&format!(
                "Skipping {} (excluded by {})",
                skipped.identifier, skipped.reason
            ));
        }
        debug!(
            planned = plan.len(),
            skipped = plan.skipped().len(),
            "transfer plan built"
        );

        let mut result = TransferResult::default();
        for planned in plan.transfers() {
            let bytes = self.copy_file(planned).await?;
            result.record(planned.local_path.clone(), bytes);
        }

        info!(
            files = result.len(),
            bytes = result.bytes_written(),
            "transfer complete"
        );
        self.progress.emit(&format!(
            "Downloaded {} file(s) to {}",
            result.len(),
            request.destination
        ));

        Ok(result)
    }

    async fn ensure_destination(&self, destination: &str) -> Result<(), TransferError> {
        self.progress
            .emit(&format!("Checking {destination} directory existence..."));
        if self.local.directory_exists(destination).await? {
            return Ok(());
        }

        self.progress
            .emit(&format!("Creating {destination} directory..."));
        self.local
            .create_directory(destination, &self.options.directory)
            .await?;
        debug!(destination, "created destination directory");
        Ok(())
    }

    async fn copy_file(&self, planned: &PlannedTransfer) -> Result<u64, TransferError> {
        let identifier = planned.identifier.as_str();

        self.progress
            .emit(&format!("Checking {identifier} file existence..."));
        if !self.remote.exists(identifier).await? {
            return Err(TransferError::remote_file_not_found(identifier));
        }

        self.progress.emit(&format!("Downloading {identifier}..."));
        let stream = self.remote.read_stream(identifier).await?;
        let outcome = self
            .local
            .write_stream(&planned.local_path, stream, &self.options.write)
            .await?;

        match outcome {
            WriteOutcome::Written { bytes } => {
                info!(file = identifier, path = %planned.local_path, bytes, "file copied");
                Ok(bytes)
            }
            WriteOutcome::Rejected { reason } => {
                warn!(path = %planned.local_path, %reason, "local store rejected write");
                Err(TransferError::write_failed(planned.local_path.clone(), reason))
            }
        }
    }
}
