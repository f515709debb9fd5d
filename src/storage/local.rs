//! Local filesystem store rooted at a directory.

use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::{
    ByteStream, DirectoryOptions, Storage, StorageError, WriteOptions, WriteOutcome,
    normalize_path,
};

/// Size of the chunks yielded by [`LocalStorage::read_stream`].
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Store backed by a directory on the local filesystem.
///
/// Every store path is resolved beneath `root`; paths that would climb out of
/// it are rejected.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a store rooted at `root`. The directory does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a store path to a filesystem path under the root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] for paths containing `..`.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let normalized = normalize_path(path)?;
        let mut resolved = self.root.clone();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        tokio::fs::try_exists(&resolved)
            .await
            .map_err(|e| StorageError::io(resolved, e))
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        match tokio::fs::metadata(&resolved).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(false)
            }
            Err(e) => Err(StorageError::io(resolved, e)),
        }
    }

    #[instrument(level = "debug", skip(self, options), fields(root = %self.root.display()))]
    async fn create_directory(
        &self,
        path: &str,
        options: &DirectoryOptions,
    ) -> Result<(), StorageError> {
        let resolved = self.resolve(path)?;
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        if let Some(mode) = options.mode {
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = options;
        builder
            .create(&resolved)
            .await
            .map_err(|e| StorageError::io(resolved.clone(), e))?;
        debug!(path = %resolved.display(), "created directory");
        Ok(())
    }

    async fn read_stream(&self, path: &str) -> Result<ByteStream, StorageError> {
        let resolved = self.resolve(path)?;
        let file = File::open(&resolved)
            .await
            .map_err(|e| StorageError::io(resolved.clone(), e))?;
        Ok(file_chunks(file, resolved))
    }

    #[instrument(level = "debug", skip(self, stream, options), fields(root = %self.root.display()))]
    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        options: &WriteOptions,
    ) -> Result<WriteOutcome, StorageError> {
        let resolved = self.resolve(path)?;

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => {
                return Ok(WriteOutcome::Rejected {
                    reason: "target is a directory".to_string(),
                });
            }
            Ok(_) if !options.overwrite => {
                return Ok(WriteOutcome::Rejected {
                    reason: "target exists and overwrite is disabled".to_string(),
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(resolved, e)),
        }

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent.to_path_buf(), e))?;
        }

        // The target is only replaced once the whole stream is on disk.
        let partial = partial_path(&resolved);
        let file = File::create(&partial)
            .await
            .map_err(|e| StorageError::io(partial.clone(), e))?;

        let result = match stream_to_file(file, stream, &partial).await {
            Ok(bytes) => tokio::fs::rename(&partial, &resolved)
                .await
                .map(|()| bytes)
                .map_err(|e| StorageError::io(resolved.clone(), e)),
            Err(e) => Err(e),
        };
        if result.is_err() {
            debug!(path = %partial.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&partial).await;
        }
        let bytes = result?;

        Ok(WriteOutcome::Written { bytes })
    }
}

/// Hidden sibling a write streams into before it is renamed over `target`.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_else(|| OsStr::new("download")));
    name.push(".part");
    target.with_file_name(name)
}

/// Turns an open file into a stream of fixed-size chunks.
fn file_chunks(file: File, path: PathBuf) -> ByteStream {
    Box::pin(futures_util::stream::try_unfold(
        (file, path),
        |(mut file, path)| async move {
            let mut buf = vec![0u8; READ_CHUNK_SIZE];
            let read = file
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::io(path.clone(), e))?;
            if read == 0 {
                return Ok::<_, StorageError>(None);
            }
            buf.truncate(read);
            Ok(Some((buf, (file, path))))
        },
    ))
}

/// Streams chunks into `file`, returning bytes written.
async fn stream_to_file(
    file: File,
    mut stream: ByteStream,
    file_path: &Path,
) -> Result<u64, StorageError> {
    let mut writer = BufWriter::new(file);
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| StorageError::io(file_path.to_path_buf(), e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| StorageError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use tempfile::TempDir;

    fn bytes_stream(chunks: &[&[u8]]) -> ByteStream {
        let chunks: Vec<Result<Vec<u8>, StorageError>> =
            chunks.iter().map(|c| Ok(c.to_vec())).collect();
        Box::pin(futures_util::stream::iter(chunks))
    }

    #[test]
    fn test_resolve_joins_segments_under_root() {
        let store = LocalStorage::new("/srv/data");
        assert_eq!(
            store.resolve("temp//tmp/test.txt").unwrap(),
            PathBuf::from("/srv/data/temp/tmp/test.txt")
        );
        assert_eq!(store.resolve("/").unwrap(), PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let store = LocalStorage::new("/srv/data");
        assert!(store.resolve("../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());

        let outcome = store
            .write_stream(
                "nested/dir/file.bin",
                bytes_stream(&[b"hello ", b"world"]),
                &WriteOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written { bytes: 11 });

        let chunks: Vec<Vec<u8>> = store
            .read_stream("nested/dir/file.bin")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello world");
        assert!(store.directory_exists("nested/dir").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_stream_splits_large_files_into_chunks() {
        let dir = TempDir::new().unwrap();
        let content = vec![7u8; READ_CHUNK_SIZE * 2 + 10];
        std::fs::write(dir.path().join("big.bin"), &content).unwrap();
        let store = LocalStorage::new(dir.path());

        let chunks: Vec<Vec<u8>> = store
            .read_stream("big.bin")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= READ_CHUNK_SIZE));
        assert_eq!(chunks.concat(), content);
    }

    #[tokio::test]
    async fn test_exists_and_directory_exists() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/file.txt"), b"x").unwrap();
        let store = LocalStorage::new(dir.path());

        assert!(store.exists("a/file.txt").await.unwrap());
        assert!(store.exists("a").await.unwrap());
        assert!(!store.exists("a/missing.txt").await.unwrap());
        assert!(store.directory_exists("a").await.unwrap());
        assert!(!store.directory_exists("a/file.txt").await.unwrap());
        assert!(!store.directory_exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_directory_is_recursive() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        store
            .create_directory("x/y/z", &DirectoryOptions::default())
            .await
            .unwrap();
        assert!(dir.path().join("x/y/z").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_create_directory_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        store
            .create_directory("private", &DirectoryOptions { mode: Some(0o700) })
            .await
            .unwrap();
        let mode = std::fs::metadata(dir.path().join("private"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_write_rejected_when_target_is_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("taken")).unwrap();
        let store = LocalStorage::new(dir.path());

        let outcome = store
            .write_stream("taken", bytes_stream(&[b"x"]), &WriteOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, WriteOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_write_respects_overwrite_flag() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"old").unwrap();
        let store = LocalStorage::new(dir.path());

        let outcome = store
            .write_stream(
                "a.txt",
                bytes_stream(&[b"new"]),
                &WriteOptions { overwrite: false },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, WriteOutcome::Rejected { .. }));
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"old");

        store
            .write_stream("a.txt", bytes_stream(&[b"new"]), &WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_failed_stream_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        let failing: ByteStream = Box::pin(futures_util::stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(StorageError::http_status("https://example.com/a", 500)),
        ]));

        let result = store
            .write_stream("a.txt", failing, &WriteOptions::default())
            .await;
        assert!(matches!(result, Err(StorageError::HttpStatus { status: 500, .. })));
        assert!(!dir.path().join("a.txt").exists());
        assert!(!dir.path().join(".a.txt.part").exists());
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("temp")).unwrap();
        std::fs::write(dir.path().join("temp/a.txt"), b"good copy from last run").unwrap();
        let store = LocalStorage::new(dir.path());
        let failing: ByteStream = Box::pin(futures_util::stream::iter(vec![
            Ok(b"half of the new".to_vec()),
            Err(StorageError::http_status("https://example.com/a.txt", 503)),
        ]));

        let result = store
            .write_stream("temp/a.txt", failing, &WriteOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(
            std::fs::read(dir.path().join("temp/a.txt")).unwrap(),
            b"good copy from last run"
        );
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("temp"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![OsString::from("a.txt")]);
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/srv/data/temp/a.txt")),
            PathBuf::from("/srv/data/temp/.a.txt.part")
        );
    }
}
