//! Browser automation capability.
//!
//! The publish sequencer only ever sees [`BrowserEngine`] and
//! [`BrowserSession`]. [`WebDriverEngine`] implements them over the WebDriver
//! protocol; tests substitute the mocks in `crate::testing`.

mod webdriver;

pub use webdriver::{capabilities, WebDriverEngine};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BrowserConfig;

/// The browser engine could not provide a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to start browser session: {0}")]
    StartFailed(String),
}

/// A command issued through an open session failed.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Timed out after {waited:?} waiting for '{condition}'")]
    Timeout { condition: String, waited: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser command failed: {0}")]
    Command(String),

    #[error("Session is closed")]
    Closed,
}

/// Session-level options. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl From<&BrowserConfig> for SessionOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

/// Starts browser sessions. One session per publish request, never reused.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Name of this engine implementation.
    fn name(&self) -> &str;

    /// Start a fresh session.
    async fn open(&self, options: &SessionOptions)
        -> Result<Box<dyn BrowserSession>, SessionError>;
}

/// One live browser instance. Selectors are CSS selectors.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to `url` and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Wait until an element matching `selector` is present, at most `timeout`.
    async fn wait_for_element(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// URL of the current page.
    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Clear the control and type `value` into it.
    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BrowserError>;

    /// Hand a local file to a file-input control.
    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), BrowserError>;

    /// Click the element.
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Whether the session has not been closed yet.
    fn is_open(&self) -> bool;

    /// Shut the browser down. Closing twice is a no-op.
    async fn close(&self) -> Result<(), BrowserError>;
}
