//! Read-only remote store served over HTTP(S).
//!
//! Identifiers are joined onto a base URL; existence is probed with `HEAD`
//! and file contents are streamed from a `GET` response body.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::{ByteStream, Storage, StorageError, normalize_path};

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Remote store backed by an HTTP server.
///
/// The client is built once and reused for every request, taking advantage of
/// connection pooling.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    base: Url,
    client: Client,
}

impl HttpStorage {
    /// Creates a store for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidUrl`] if `base_url` cannot be parsed or
    /// cannot serve as a base, and [`StorageError::Network`] if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, StorageError> {
        Self::with_timeouts(base_url, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a store for `base_url` with explicit timeout values.
    ///
    /// # Errors
    ///
    /// See [`HttpStorage::new`].
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let mut base =
            Url::parse(base_url).map_err(|_| StorageError::invalid_url(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::invalid_url(base_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| StorageError::network(base_url.to_string(), e))?;

        debug!(base = %base, "created HTTP storage");
        Ok(Self { base, client })
    }

    /// Returns the base URL every identifier is resolved against.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves a store path to an absolute URL below the base.
    ///
    /// Each path segment is percent-encoded, so `#`, `?`, `%` and `:` in an
    /// identifier stay part of the file name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] for paths containing `..`.
    pub fn url_for(&self, path: &str) -> Result<Url, StorageError> {
        self.segment_url(path, false)
    }

    fn segment_url(&self, path: &str, trailing_slash: bool) -> Result<Url, StorageError> {
        let normalized = normalize_path(path)?;
        if normalized.is_empty() {
            return Ok(self.base.clone());
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StorageError::invalid_url(self.base.to_string()))?;
            segments.pop_if_empty().extend(normalized.split('/'));
            if trailing_slash {
                segments.push("");
            }
        }
        Ok(url)
    }

    async fn probe(&self, url: Url) -> Result<bool, StorageError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| StorageError::network(url.as_str(), e))?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "probed remote entry");
        if status.is_success() {
            Ok(true)
        } else if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            Ok(false)
        } else {
            Err(StorageError::http_status(url.as_str(), status.as_u16()))
        }
    }
}

#[async_trait]
impl Storage for HttpStorage {
    fn backend(&self) -> &'static str {
        "http"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let url = self.url_for(path)?;
        self.probe(url).await
    }

    async fn directory_exists(&self, path: &str) -> Result<bool, StorageError> {
        let url = self.segment_url(path, true)?;
        self.probe(url).await
    }

    #[instrument(level = "debug", skip(self), fields(base = %self.base))]
    async fn read_stream(&self, path: &str) -> Result<ByteStream, StorageError> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| StorageError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::http_status(url.as_str(), status.as_u16()));
        }

        let source = url.to_string();
        Ok(Box::pin(response.bytes_stream().map(move |chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| StorageError::network(source.clone(), e))
        })))
    }
}
