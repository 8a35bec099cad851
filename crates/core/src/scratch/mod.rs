//! Request-scoped scratch files for downloaded assets.
//!
//! A [`ScratchFile`] only reserves a unique path; whoever fills it (the
//! fetcher) creates the content. The owning request must call
//! [`ScratchFile::release`] on every exit path. If a path is dropped without
//! being released (a panic unwinding through the request, for instance),
//! `Drop` removes the file synchronously as a last resort.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ScratchConfig;

/// Suffix used when the source URL carries no usable extension.
pub const DEFAULT_SUFFIX: &str = ".wav";

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("Failed to prepare scratch directory {path}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory that hands out unique scratch paths.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Uses `scratch.dir` when configured, `<system temp>/beatpub` otherwise.
    pub fn from_config(config: &ScratchConfig) -> Self {
        match &config.dir {
            Some(dir) => Self::new(dir),
            None => Self::new(std::env::temp_dir().join("beatpub")),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a uniquely named path ending in `suffix`.
    ///
    /// Creates the directory if needed but never the file itself.
    pub async fn acquire(&self, suffix: &str) -> Result<ScratchFile, ScratchError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ScratchError::DirectoryUnavailable {
                path: self.root.clone(),
                source,
            })?;

        let path = self.root.join(format!("{}{}", Uuid::new_v4(), suffix));
        debug!(path = %path.display(), "Reserved scratch file");

        Ok(ScratchFile {
            path,
            released: false,
        })
    }
}

/// A reserved scratch path owned by exactly one request.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file currently exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Delete the backing file if present.
    ///
    /// Never fails: a missing file is fine and other errors are only logged,
    /// so cleanup cannot replace the request's real outcome.
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed scratch file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Scratch file already absent");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!(
                path = %self.path.display(),
                "Scratch file removed on drop without explicit release"
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file on drop");
            }
        }
    }
}

/// Pick a scratch suffix from the extension of the URL's last path segment.
pub fn suffix_for_url(source_url: &str) -> String {
    reqwest::Url::parse(source_url)
        .ok()
        .and_then(|url| {
            let segment = url.path_segments()?.next_back()?.to_string();
            let (_, ext) = segment.rsplit_once('.')?;
            let valid = !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric());
            valid.then(|| format!(".{}", ext.to_ascii_lowercase()))
        })
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string())
}
