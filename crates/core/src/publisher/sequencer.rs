//! The publish state machine.
//!
//! ```text
//! Start -> LoggedIn -> OnUploadPage -> FileAttached -> MetadataFilled -> Submitted -> Done
//! ```
//!
//! Stages run strictly in order against one [`BrowserSession`]. A failing
//! transition aborts the whole run; there is no resume or retry. Every
//! failure leaves as a single [`PublishError`] that records the stage being
//! left and keeps the cause for logging.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::browser::{BrowserError, BrowserSession};
use crate::config::{BrowserConfig, MarketplaceConfig, SelectorsConfig};
use crate::metrics::STAGE_FAILURES;

use super::types::PublishRequest;

/// Marketplace account credentials, injected at construction.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&MarketplaceConfig> for Credentials {
    fn from(config: &MarketplaceConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Surfaces, selectors and timings the sequencer drives.
#[derive(Debug, Clone)]
pub struct SequencerSettings {
    pub login_url: String,
    pub upload_url: String,
    pub post_login_url_contains: Option<String>,
    pub selectors: SelectorsConfig,
    pub element_timeout: Duration,
    pub login_timeout: Duration,
    pub poll_interval: Duration,
    pub settle: Duration,
}

impl SequencerSettings {
    pub fn from_config(
        marketplace: &MarketplaceConfig,
        selectors: &SelectorsConfig,
        browser: &BrowserConfig,
    ) -> Self {
        Self {
            login_url: marketplace.login_url.clone(),
            upload_url: marketplace.upload_url.clone(),
            post_login_url_contains: marketplace.post_login_url_contains.clone(),
            selectors: selectors.clone(),
            element_timeout: Duration::from_secs(browser.element_timeout_secs),
            login_timeout: Duration::from_secs(browser.login_timeout_secs),
            poll_interval: Duration::from_millis(browser.poll_interval_ms),
            settle: Duration::from_secs(browser.settle_secs),
        }
    }
}

/// Stages of the publish state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Start,
    LoggedIn,
    OnUploadPage,
    FileAttached,
    MetadataFilled,
    Submitted,
    Done,
}

impl PublishStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::LoggedIn => "logged_in",
            Self::OnUploadPage => "on_upload_page",
            Self::FileAttached => "file_attached",
            Self::MetadataFilled => "metadata_filled",
            Self::Submitted => "submitted",
            Self::Done => "done",
        }
    }

    /// The following stage. `Done` is terminal.
    pub fn next(&self) -> Self {
        match self {
            Self::Start => Self::LoggedIn,
            Self::LoggedIn => Self::OnUploadPage,
            Self::OnUploadPage => Self::FileAttached,
            Self::FileAttached => Self::MetadataFilled,
            Self::MetadataFilled => Self::Submitted,
            Self::Submitted | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single transition failed.
#[derive(Debug, Error)]
pub enum StageError {
    /// The login form never showed up.
    #[error("Login form did not appear: {0}")]
    Timeout(#[source] BrowserError),

    /// Credentials were submitted but no authenticated page followed.
    #[error("Login was not confirmed: {0}")]
    LoginFailed(String),

    /// The upload form's file input never showed up.
    #[error("Upload form unavailable: {0}")]
    UploadFormUnavailable(#[source] BrowserError),

    /// A confirmation marker was configured and never appeared.
    #[error("Upload was not confirmed: {0}")]
    NotConfirmed(#[source] BrowserError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// A sequencer run failed. The only error the orchestrator sees.
#[derive(Debug, Error)]
#[error("Publish failed at stage {stage}: {source}")]
pub struct PublishError {
    pub stage: PublishStage,
    #[source]
    pub source: StageError,
}

/// Drives the marketplace UI from login to submission.
#[derive(Debug, Clone)]
pub struct PublishSequencer {
    credentials: Credentials,
    settings: SequencerSettings,
}

impl PublishSequencer {
    pub fn new(credentials: Credentials, settings: SequencerSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    pub fn settings(&self) -> &SequencerSettings {
        &self.settings
    }

    /// Run every stage from `Start` to `Done`.
    pub async fn run(
        &self,
        session: &dyn BrowserSession,
        request: &PublishRequest,
        asset: &Path,
    ) -> Result<(), PublishError> {
        let mut stage = PublishStage::Start;

        while stage != PublishStage::Done {
            let next = match self.advance(stage, session, request, asset).await {
                Ok(next) => next,
                Err(source) => {
                    STAGE_FAILURES.with_label_values(&[stage.as_str()]).inc();
                    error!(stage = %stage, error = %source, "Publish stage failed");
                    return Err(PublishError { stage, source });
                }
            };
            debug!(from = %stage, to = %next, "Publish stage complete");
            stage = next;
        }

        info!(title = request.title(), "Publish sequence reached done");
        Ok(())
    }

    async fn advance(
        &self,
        stage: PublishStage,
        session: &dyn BrowserSession,
        request: &PublishRequest,
        asset: &Path,
    ) -> Result<PublishStage, StageError> {
        match stage {
            PublishStage::Start => self.log_in(session).await?,
            PublishStage::LoggedIn => session.goto(&self.settings.upload_url).await?,
            PublishStage::OnUploadPage => self.attach_asset(session, asset).await?,
            PublishStage::FileAttached => self.fill_metadata(session, request).await?,
            PublishStage::MetadataFilled => {
                session.click(&self.settings.selectors.submit).await?
            }
            PublishStage::Submitted => self.settle(session).await?,
            PublishStage::Done => {}
        }
        Ok(stage.next())
    }

    async fn log_in(&self, session: &dyn BrowserSession) -> Result<(), StageError> {
        let selectors = &self.settings.selectors;

        session.goto(&self.settings.login_url).await?;
        session
            .wait_for_element(&selectors.username, self.settings.element_timeout)
            .await
            .map_err(|e| match e {
                BrowserError::Timeout { .. } => StageError::Timeout(e),
                other => StageError::Browser(other),
            })?;

        session
            .set_value(&selectors.username, &self.credentials.username)
            .await?;
        session
            .set_value(&selectors.password, &self.credentials.password)
            .await?;
        session.click(&selectors.login_submit).await?;

        self.wait_for_login(session).await
    }

    async fn wait_for_login(&self, session: &dyn BrowserSession) -> Result<(), StageError> {
        let timeout = self.settings.login_timeout;

        match &self.settings.post_login_url_contains {
            Some(fragment) => {
                let poll = async {
                    loop {
                        let url = session.current_url().await?;
                        if url.contains(fragment.as_str()) {
                            return Ok::<(), BrowserError>(());
                        }
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                };
                match tokio::time::timeout(timeout, poll).await {
                    Ok(result) => result.map_err(StageError::Browser),
                    Err(_) => Err(StageError::LoginFailed(format!(
                        "URL did not contain '{}' within {:?}",
                        fragment, timeout
                    ))),
                }
            }
            None => session
                .wait_for_element(&self.settings.selectors.post_login, timeout)
                .await
                .map_err(|e| match e {
                    BrowserError::Timeout { .. } => StageError::LoginFailed(e.to_string()),
                    other => StageError::Browser(other),
                }),
        }
    }

    async fn attach_asset(
        &self,
        session: &dyn BrowserSession,
        asset: &Path,
    ) -> Result<(), StageError> {
        let file_input = &self.settings.selectors.file_input;
        session
            .wait_for_element(file_input, self.settings.element_timeout)
            .await
            .map_err(|e| match e {
                BrowserError::Timeout { .. } => StageError::UploadFormUnavailable(e),
                other => StageError::Browser(other),
            })?;
        session.attach_file(file_input, asset).await?;
        Ok(())
    }

    async fn fill_metadata(
        &self,
        session: &dyn BrowserSession,
        request: &PublishRequest,
    ) -> Result<(), StageError> {
        let selectors = &self.settings.selectors;

        session
            .wait_for_element(&selectors.title, self.settings.element_timeout)
            .await?;
        session.set_value(&selectors.title, request.title()).await?;

        // Optional controls are only looked up when the field was provided.
        if let Some(tags) = request.tags() {
            session.set_value(&selectors.tags, tags).await?;
        }
        if let Some(bpm) = request.bpm() {
            session.set_value(&selectors.bpm, &format_bpm(bpm)).await?;
        }
        if let Some(key) = request.key() {
            session.set_value(&selectors.key, key).await?;
        }
        Ok(())
    }

    async fn settle(&self, session: &dyn BrowserSession) -> Result<(), StageError> {
        tokio::time::sleep(self.settings.settle).await;

        if let Some(confirmation) = &self.settings.selectors.confirmation {
            session
                .wait_for_element(confirmation, self.settings.element_timeout)
                .await
                .map_err(StageError::NotConfirmed)?;
        }
        Ok(())
    }
}

/// String form of a bpm value: whole numbers without a fraction.
pub fn format_bpm(bpm: f64) -> String {
    if bpm.fract() == 0.0 && bpm.abs() < 1e15 {
        format!("{}", bpm as i64)
    } else {
        bpm.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserEngine, SessionOptions};
    use crate::testing::{fixtures, MockBrowserEngine};

    fn sequencer() -> PublishSequencer {
        let config = fixtures::config(&std::env::temp_dir().join("beatpub-sequencer-test"));
        PublishSequencer::new(
            Credentials::from(&config.marketplace),
            SequencerSettings::from_config(&config.marketplace, &config.selectors, &config.browser),
        )
    }

    /// Run the sequencer with `selector` never appearing.
    async fn run_with_missing(selector: &str) -> PublishError {
        let engine = MockBrowserEngine::new();
        engine.set_missing_element(selector);
        let session = engine.open(&SessionOptions::default()).await.unwrap();
        let request = PublishRequest::new("https://x/a.wav", "Beat 1").unwrap();

        let result = sequencer()
            .run(session.as_ref(), &request, Path::new("/tmp/a.wav"))
            .await;
        session.close().await.unwrap();

        result.expect_err("sequence should fail")
    }

    #[tokio::test]
    async fn test_missing_login_form_is_timeout_at_start() {
        let selector = sequencer().settings().selectors.username.clone();
        let err = run_with_missing(&selector).await;

        assert_eq!(err.stage, PublishStage::Start);
        assert!(matches!(
            err.source,
            StageError::Timeout(BrowserError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_post_login_marker_is_login_failed() {
        let selector = sequencer().settings().selectors.post_login.clone();
        let err = run_with_missing(&selector).await;

        assert_eq!(err.stage, PublishStage::Start);
        assert!(matches!(err.source, StageError::LoginFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_file_input_is_upload_form_unavailable() {
        let selector = sequencer().settings().selectors.file_input.clone();
        let err = run_with_missing(&selector).await;

        assert_eq!(err.stage, PublishStage::OnUploadPage);
        assert!(matches!(
            err.source,
            StageError::UploadFormUnavailable(BrowserError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_title_control_fails_at_file_attached() {
        let selector = sequencer().settings().selectors.title.clone();
        let err = run_with_missing(&selector).await;

        assert_eq!(err.stage, PublishStage::FileAttached);
        assert!(matches!(
            err.source,
            StageError::Browser(BrowserError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_confirmation_is_not_confirmed_at_submitted() {
        let mut sequencer = sequencer();
        sequencer.settings.selectors.confirmation = Some(".upload-complete".to_string());

        let engine = MockBrowserEngine::new();
        engine.set_missing_element(".upload-complete");
        let session = engine.open(&SessionOptions::default()).await.unwrap();
        let request = PublishRequest::new("https://x/a.wav", "Beat 1").unwrap();

        let err = sequencer
            .run(session.as_ref(), &request, Path::new("/tmp/a.wav"))
            .await
            .expect_err("sequence should fail");

        assert_eq!(err.stage, PublishStage::Submitted);
        assert!(matches!(err.source, StageError::NotConfirmed(_)));
    }

    #[test]
    fn test_stage_order() {
        let mut stage = PublishStage::Start;
        let mut seen = vec![stage];
        while stage != PublishStage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                PublishStage::Start,
                PublishStage::LoggedIn,
                PublishStage::OnUploadPage,
                PublishStage::FileAttached,
                PublishStage::MetadataFilled,
                PublishStage::Submitted,
                PublishStage::Done,
            ]
        );
        assert_eq!(PublishStage::Done.next(), PublishStage::Done);
    }

    #[test]
    fn test_format_bpm() {
        assert_eq!(format_bpm(140.0), "140");
        assert_eq!(format_bpm(92.5), "92.5");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "producer".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("producer"));
        assert!(!debug.contains("hunter2"));
    }
}
