//! HTTP(S) asset fetcher backed by reqwest.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::config::FetcherConfig;
use crate::metrics::FETCHED_BYTES;

use super::{AssetFetcher, FetchError};

/// Streams response bodies chunk by chunk straight to disk.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetcherConfig::default())
    }

    fn check_size(&self, size: u64) -> Result<(), FetchError> {
        match self.config.max_size_bytes {
            Some(limit) if size > limit => Err(FetchError::TooLarge { size, limit }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, source_url: &str, destination: &Path) -> Result<u64, FetchError> {
        let url = reqwest::Url::parse(source_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", source_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        debug!(url = %url, "Requesting asset");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            self.check_size(length)?;
        }

        let file = File::create(destination).await?;
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, file);
        let mut stream = response.bytes_stream();
        let mut total_bytes = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            total_bytes += chunk.len() as u64;
            self.check_size(total_bytes)?;
            writer.write_all(&chunk).await?;
        }

        writer.flush().await?;
        FETCHED_BYTES.inc_by(total_bytes);

        info!(
            path = %destination.display(),
            bytes = total_bytes,
            "Asset downloaded"
        );
        Ok(total_bytes)
    }
}
