//! Batch transfer of remote files into a local destination directory.
//!
//! # Features
//!
//! - Parameter bundle parsing and validation at the boundary
//! - Exclusion by basename and by full identifier, resolved before any remote I/O
//! - Destination directory auto-creation
//! - Streaming copies (memory use independent of file size)
//! - Fail-fast: the first error aborts the remaining files
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use files_downloader::{FilesDownloader, MemoryStorage, NoopProgress};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = Arc::new(MemoryStorage::new());
//! remote.put("tmp/test.txt", "hello");
//! let downloader = FilesDownloader::new(Arc::new(MemoryStorage::new()), remote, Arc::new(NoopProgress));
//! let bundle = serde_json::json!({
//!     "parameters": { "files": ["tmp/test.txt"], "destination": "temp" }
//! });
//! let result = downloader.invoke(&bundle).await?;
//! assert_eq!(result.paths(), ["temp/tmp/test.txt".to_string()]);
//! # Ok(())
//! # }
//! ```

mod error;
mod orchestrator;
mod plan;
mod request;
mod result;

pub use error::TransferError;
pub use orchestrator::{FilesDownloader, TransferOptions};
pub use plan::{
    ExclusionReason, PlannedTransfer, SkippedFile, TransferPlan, basename, exclusion_reason,
};
pub use request::{ExclusionRules, TransferRequest};
pub use result::TransferResult;

// Note: we do NOT define a module-local Result alias.
// Use `Result<T, TransferError>` explicitly in function signatures.
