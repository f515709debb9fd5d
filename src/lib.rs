//! Files Downloader Library
//!
//! This library copies a batch of files from a remote store into a local
//! destination directory. It is one step of a larger pipeline: it receives a
//! parameter bundle, filters the requested files through optional exclusion
//! rules, streams each surviving file to the local store, and hands back the
//! list of local paths it wrote.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`storage`] - Storage capability trait with local, HTTP and in-memory backends
//! - [`progress`] - Progress sinks for free-text status messages
//! - [`transfer`] - Request validation, exclusion filtering and the streaming copy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod progress;
pub mod storage;
pub mod transfer;

// Re-export commonly used types
pub use progress::{NoopProgress, ProgressSink, RecordingProgress, TracingProgress};
pub use storage::{
    ByteStream, DirectoryOptions, HttpStorage, LocalStorage, MemoryStorage, Storage, StorageCall,
    StorageError, WriteOptions, WriteOutcome,
};
pub use transfer::{
    ExclusionReason, ExclusionRules, FilesDownloader, PlannedTransfer, SkippedFile, TransferError,
    TransferOptions, TransferPlan, TransferRequest, TransferResult,
};
