//! WebDriver-backed browser engine (chromedriver, geckodriver).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::{BrowserConfig, BrowserKind};

use super::{BrowserEngine, BrowserError, BrowserSession, SessionError, SessionOptions};

/// Opens sessions against a running WebDriver server.
pub struct WebDriverEngine {
    webdriver_url: String,
    kind: BrowserKind,
    poll_interval: Duration,
}

impl WebDriverEngine {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            kind: config.kind,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// WebDriver capabilities for the given browser and session options.
pub fn capabilities(kind: BrowserKind, options: &SessionOptions) -> Map<String, Value> {
    let size = (options.viewport_width, options.viewport_height);
    let caps = match kind {
        BrowserKind::Chrome => {
            let mut args = vec![
                format!("--window-size={},{}", size.0, size.1),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ];
            if options.headless {
                args.push("--headless=new".to_string());
            }
            json!({ "browserName": "chrome", "goog:chromeOptions": { "args": args } })
        }
        BrowserKind::Firefox => {
            let mut args = vec![format!("--width={}", size.0), format!("--height={}", size.1)];
            if options.headless {
                args.push("-headless".to_string());
            }
            json!({ "browserName": "firefox", "moz:firefoxOptions": { "args": args } })
        }
    };

    match caps {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn open(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn BrowserSession>, SessionError> {
        debug!(url = %self.webdriver_url, kind = ?self.kind, "Connecting to WebDriver");

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities(self.kind, options));
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| SessionError::StartFailed(e.to_string()))?;

        if let Err(e) = client
            .set_window_size(options.viewport_width, options.viewport_height)
            .await
        {
            if let Err(close_err) = client.close().await {
                warn!(error = %close_err, "Failed to close half-started browser session");
            }
            return Err(SessionError::StartFailed(format!(
                "could not set viewport: {}",
                e
            )));
        }

        info!(
            width = options.viewport_width,
            height = options.viewport_height,
            headless = options.headless,
            "Browser session opened"
        );

        Ok(Box::new(WebDriverSession {
            client,
            poll_interval: self.poll_interval,
            open: AtomicBool::new(true),
        }))
    }
}

struct WebDriverSession {
    client: Client,
    poll_interval: Duration,
    open: AtomicBool,
}

impl WebDriverSession {
    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BrowserError::Closed)
        }
    }

    async fn find(&self, selector: &str) -> Result<fantoccini::elements::Element, BrowserError> {
        self.ensure_open()?;
        self.client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| element_error(selector, e))
    }
}

fn element_error(selector: &str, error: CmdError) -> BrowserError {
    match error {
        e if e.is_no_such_element() => BrowserError::ElementNotFound(selector.to_string()),
        other => BrowserError::Command(other.to_string()),
    }
}

fn command_error(error: CmdError) -> BrowserError {
    BrowserError::Command(error.to_string())
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        debug!(url, "Navigating");
        self.client.goto(url).await.map_err(command_error)
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.ensure_open()?;
        match self
            .client
            .wait()
            .at_most(timeout)
            .every(self.poll_interval)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(()),
            Err(CmdError::WaitTimeout) => Err(BrowserError::Timeout {
                condition: selector.to_string(),
                waited: timeout,
            }),
            Err(e) => Err(command_error(e)),
        }
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        let url = self.client.current_url().await.map_err(command_error)?;
        Ok(url.to_string())
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.clear().await.map_err(command_error)?;
        element.send_keys(value).await.map_err(command_error)
    }

    async fn attach_file(&self, selector: &str, path: &Path) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        let path = path.to_string_lossy();
        element.send_keys(&path).await.map_err(command_error)
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.click().await.map_err(command_error)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.client.clone().close().await.map_err(command_error)?;
        debug!("Browser session closed");
        Ok(())
    }
}
