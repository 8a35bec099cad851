//! Mock asset fetcher for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fetcher::{AssetFetcher, FetchError};

/// A recorded fetch call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// URL that was requested.
    pub source_url: String,
    /// Where the asset was written.
    pub destination: PathBuf,
}

/// Mock implementation of the AssetFetcher trait.
///
/// Writes a fixed body to the destination, or fails with a configured HTTP
/// status, and records every call.
///
/// # Example
///
/// ```rust,ignore
/// let fetcher = MockFetcher::new();
/// fetcher.fail_with_status(404).await;
///
/// let result = fetcher.fetch("https://x/a.wav", &path).await;
/// assert!(matches!(result, Err(FetchError::Status { status: 404 })));
/// assert_eq!(fetcher.fetch_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    /// Recorded fetch calls.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// Bytes written on success.
    body: Arc<RwLock<Vec<u8>>>,
    /// When set, every fetch fails with this status.
    fail_status: Arc<RwLock<Option<u16>>>,
    /// If set, the next fetch fails with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a mock fetcher that serves a small fake WAV header.
    pub fn new() -> Self {
        Self {
            fetches: Arc::new(RwLock::new(Vec::new())),
            body: Arc::new(RwLock::new(b"RIFF\0\0\0\0WAVEfmt ".to_vec())),
            fail_status: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the body written on success.
    pub async fn set_body(&self, body: impl Into<Vec<u8>>) {
        *self.body.write().await = body.into();
    }

    /// Make every fetch fail with the given HTTP status.
    pub async fn fail_with_status(&self, status: u16) {
        *self.fail_status.write().await = Some(status);
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded fetch calls.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Number of fetch calls made.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, source_url: &str, destination: &Path) -> Result<u64, FetchError> {
        self.fetches.write().await.push(RecordedFetch {
            source_url: source_url.to_string(),
            destination: destination.to_path_buf(),
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(status) = *self.fail_status.read().await {
            return Err(FetchError::Status { status });
        }

        let body = self.body.read().await.clone();
        tokio::fs::write(destination, &body).await?;
        Ok(body.len() as u64)
    }
}
