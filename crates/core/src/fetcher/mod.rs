//! Asset fetcher: streams a remote audio asset into a local file.
//!
//! One attempt per call. Any retry policy belongs to the caller, and the
//! destination file is never removed here; the scratch file owner cleans up.

mod http;

pub use http::HttpFetcher;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching an asset.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid asset URL: {0}")]
    InvalidUrl(String),

    /// Network or protocol failure talking to the remote host.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("Remote returned HTTP {status}")]
    Status { status: u16 },

    /// The asset exceeds the configured size limit.
    #[error("Asset too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Writing the destination file failed.
    #[error("Failed to write asset to disk: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Download `source_url` into `destination`, creating or overwriting it.
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, source_url: &str, destination: &Path) -> Result<u64, FetchError>;
}
