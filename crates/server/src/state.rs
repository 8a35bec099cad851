use std::sync::Arc;

use beatpub_core::{Authenticator, Config, PublishOrchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    orchestrator: Arc<PublishOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        orchestrator: Arc<PublishOrchestrator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            orchestrator,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn orchestrator(&self) -> &Arc<PublishOrchestrator> {
        &self.orchestrator
    }
}
