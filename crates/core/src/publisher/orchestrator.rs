//! Request orchestrator: validate, fetch, drive the browser, clean up.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::browser::{BrowserEngine, SessionOptions};
use crate::config::Config;
use crate::fetcher::AssetFetcher;
use crate::metrics::{PUBLISH_ATTEMPTS, PUBLISH_DURATION};
use crate::scratch::{suffix_for_url, ScratchDir, ScratchFile};

use super::sequencer::{Credentials, PublishSequencer, SequencerSettings};
use super::types::{FailureReason, PublishBeatPayload, PublishOutcome, PublishRequest};

/// Composes fetcher, scratch storage, browser engine and sequencer into one
/// publish operation per request.
///
/// Every path through [`handle_publish`](Self::handle_publish) releases the
/// scratch file exactly once and closes the browser session (if one was
/// opened) exactly once before the outcome is returned.
pub struct PublishOrchestrator {
    fetcher: Arc<dyn AssetFetcher>,
    engine: Arc<dyn BrowserEngine>,
    scratch: ScratchDir,
    sequencer: PublishSequencer,
    session_options: SessionOptions,
    marketplace_name: String,
}

impl PublishOrchestrator {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        engine: Arc<dyn BrowserEngine>,
        scratch: ScratchDir,
        sequencer: PublishSequencer,
        session_options: SessionOptions,
        marketplace_name: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            engine,
            scratch,
            sequencer,
            session_options,
            marketplace_name: marketplace_name.into(),
        }
    }

    /// Wire up an orchestrator from loaded configuration.
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn AssetFetcher>,
        engine: Arc<dyn BrowserEngine>,
    ) -> Self {
        let sequencer = PublishSequencer::new(
            Credentials::from(&config.marketplace),
            SequencerSettings::from_config(&config.marketplace, &config.selectors, &config.browser),
        );
        Self::new(
            fetcher,
            engine,
            ScratchDir::from_config(&config.scratch),
            sequencer,
            SessionOptions::from(&config.browser),
            config.marketplace.name.clone(),
        )
    }

    pub fn marketplace_name(&self) -> &str {
        &self.marketplace_name
    }

    pub fn scratch_dir(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Validate a raw payload and publish it.
    pub async fn handle_publish(&self, payload: PublishBeatPayload) -> PublishOutcome {
        let started = Instant::now();

        let outcome = match PublishRequest::try_from(payload) {
            Ok(request) => self.publish(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected publish request");
                self.failure(FailureReason::Validation(e))
            }
        };

        let label = outcome.result_label();
        PUBLISH_ATTEMPTS.with_label_values(&[label]).inc();
        PUBLISH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        outcome
    }

    /// Publish an already validated request.
    pub async fn publish(&self, request: PublishRequest) -> PublishOutcome {
        info!(
            title = request.title(),
            url = request.source_url(),
            "Publishing asset"
        );

        let scratch = match self.scratch.acquire(&suffix_for_url(request.source_url())).await {
            Ok(file) => file,
            Err(e) => {
                error!(error = %e, "Could not reserve scratch file");
                return self.failure(FailureReason::Unexpected);
            }
        };

        let result = AssertUnwindSafe(self.fetch_and_publish(&request, &scratch))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(title = request.title(), "Publish pipeline panicked");
                Err(FailureReason::Unexpected)
            });

        scratch.release().await;

        match result {
            Ok(()) => {
                info!(title = request.title(), "Asset published");
                PublishOutcome::Success {
                    message: format!(
                        "Successfully uploaded '{}' to {}",
                        request.title(),
                        self.marketplace_name
                    ),
                    external_id: request.external_id().map(String::from),
                }
            }
            Err(reason) => self.failure(reason),
        }
    }

    async fn fetch_and_publish(
        &self,
        request: &PublishRequest,
        scratch: &ScratchFile,
    ) -> Result<(), FailureReason> {
        if let Err(e) = self.fetcher.fetch(request.source_url(), scratch.path()).await {
            error!(url = request.source_url(), error = %e, "Asset download failed");
            return Err(FailureReason::Download);
        }

        let session = self.engine.open(&self.session_options).await.map_err(|e| {
            error!(engine = self.engine.name(), error = %e, "Browser session unavailable");
            FailureReason::Publish
        })?;

        let run = AssertUnwindSafe(self.sequencer.run(session.as_ref(), request, scratch.path()))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        match run {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(stage = %e.stage, error = %e, "Publish sequence failed");
                Err(FailureReason::Publish)
            }
            Err(_) => {
                error!("Publish sequence panicked");
                Err(FailureReason::Unexpected)
            }
        }
    }

    fn failure(&self, reason: FailureReason) -> PublishOutcome {
        let message = match &reason {
            FailureReason::Validation(e) => e.to_string(),
            FailureReason::Download => "Failed to download audio file".to_string(),
            FailureReason::Publish => format!("Failed to upload to {}", self.marketplace_name),
            FailureReason::Unexpected => "Unexpected error while publishing".to_string(),
        };
        PublishOutcome::Failure { reason, message }
    }
}
