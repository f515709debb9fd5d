//! In-memory store that records every capability call.
//!
//! Used as the remote and local stand-in when exercising transfers without a
//! filesystem or network.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{
    ByteStream, DirectoryOptions, Storage, StorageError, WriteOptions, WriteOutcome,
    normalize_path,
};

/// Default size of the chunks yielded by [`MemoryStorage::read_stream`].
const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A capability call observed by [`MemoryStorage`], with the path as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    /// [`Storage::exists`].
    Exists(String),
    /// [`Storage::directory_exists`].
    DirectoryExists(String),
    /// [`Storage::create_directory`].
    CreateDirectory(String),
    /// [`Storage::read_stream`].
    ReadStream(String),
    /// [`Storage::write_stream`], recorded before the stream is consumed.
    WriteStream(String),
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
    calls: Vec<StorageCall>,
    reject_writes: bool,
}

/// Store holding files in memory.
///
/// Directories exist implicitly when a file lives beneath them, and
/// explicitly once created.
#[derive(Debug)]
pub struct MemoryStorage {
    state: Mutex<State>,
    chunk_size: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the chunk size used by `read_stream` (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stores `content` at `path`, replacing any previous file.
    pub fn put(&self, path: &str, content: impl Into<Vec<u8>>) {
        let key = lossy_key(path);
        self.lock().files.insert(key, content.into());
    }

    /// Returns a copy of the file at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(&lossy_key(path)).cloned()
    }

    /// Returns true if a file (not a directory) is stored at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.lock().files.contains_key(&lossy_key(path))
    }

    /// Returns the stored file paths in sorted order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Makes every subsequent write return [`WriteOutcome::Rejected`].
    pub fn reject_writes(&self) {
        self.lock().reject_writes = true;
    }

    /// Returns the capability calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StorageCall> {
        self.lock().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: StorageCall) {
        self.lock().calls.push(call);
    }
}

impl State {
    fn is_directory(&self, key: &str) -> bool {
        if key.is_empty() || self.directories.contains(key) {
            return true;
        }
        let prefix = format!("{key}/");
        self.files.keys().any(|file| file.starts_with(&prefix))
    }
}

fn lossy_key(path: &str) -> String {
    normalize_path(path).unwrap_or_else(|_| path.to_string())
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(StorageCall::Exists(path.to_string()));
        let key = normalize_path(path)?;
        let state = self.lock();
        Ok(state.files.contains_key(&key) || state.is_directory(&key))
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.record(StorageCall::DirectoryExists(path.to_string()));
        let key = normalize_path(path)?;
        Ok(self.lock().is_directory(&key))
    }

    async fn create_directory(
        &self,
        path: &str,
        _options: &DirectoryOptions,
    ) -> Result<(), StorageError> {
        self.record(StorageCall::CreateDirectory(path.to_string()));
        let key = normalize_path(path)?;
        let mut state = self.lock();
        let mut current = String::new();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            state.directories.insert(current.clone());
        }
        Ok(())
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream, StorageError> {
        self.record(StorageCall::ReadStream(path.to_string()));
        let key = normalize_path(path)?;
        let content = self.lock().files.get(&key).cloned().ok_or_else(|| {
            StorageError::io(
                key.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })?;
        let chunks: Vec<Result<Vec<u8>, StorageError>> = content
            .chunks(self.chunk_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }

    async fn write_stream(
        &self,
        path: &str,
        mut stream: ByteStream,
        options: &WriteOptions,
    ) -> Result<WriteOutcome, StorageError> {
        self.record(StorageCall::WriteStream(path.to_string()));
        let key = normalize_path(path)?;
        {
            let state = self.lock();
            if state.reject_writes {
                return Ok(WriteOutcome::Rejected {
                    reason: "store is read-only".to_string(),
                });
            }
            if state.is_directory(&key) {
                return Ok(WriteOutcome::Rejected {
                    reason: "target is a directory".to_string(),
                });
            }
            if !options.overwrite && state.files.contains_key(&key) {
                return Ok(WriteOutcome::Rejected {
                    reason: "target exists and overwrite is disabled".to_string(),
                });
            }
        }

        let mut content = Vec::new();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk?);
        }
        let bytes = content.len() as u64;
        self.lock().files.insert(key, content);
        Ok(WriteOutcome::Written { bytes })
    }
}
