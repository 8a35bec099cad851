//! Testing utilities and mock implementations.
//!
//! Mocks for the two external capabilities of the publish pipeline, the
//! asset fetcher and the browser engine, plus fixtures for a fast config.
//!
//! # Example
//!
//! ```rust,ignore
//! use beatpub_core::testing::{fixtures, MockBrowserEngine, MockFetcher};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! let engine = Arc::new(MockBrowserEngine::new());
//! let config = fixtures::config(temp_dir.path());
//! let orchestrator = PublishOrchestrator::from_config(&config, fetcher, engine);
//! ```

mod mock_browser;
mod mock_fetcher;

pub use mock_browser::{BrowserCommand, MockBrowserEngine, MockSession};
pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::config::{
        AuthConfig, AuthMethod, BrowserConfig, Config, FetcherConfig, MarketplaceConfig,
        ScratchConfig, SelectorsConfig, ServerConfig,
    };
    use crate::publisher::PublishBeatPayload;

    /// Config with no settle delay and scratch files under `scratch_dir`.
    pub fn config(scratch_dir: &Path) -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            marketplace: MarketplaceConfig {
                name: "Beatstars".to_string(),
                username: "producer@example.com".to_string(),
                password: "hunter2".to_string(),
                login_url: "https://market.test/login".to_string(),
                upload_url: "https://market.test/upload".to_string(),
                post_login_url_contains: None,
            },
            selectors: SelectorsConfig::default(),
            browser: BrowserConfig {
                element_timeout_secs: 1,
                login_timeout_secs: 1,
                poll_interval_ms: 10,
                settle_secs: 0,
                ..Default::default()
            },
            fetcher: FetcherConfig::default(),
            scratch: ScratchConfig {
                dir: Some(scratch_dir.to_path_buf()),
            },
        }
    }

    /// Payload with only the required fields.
    pub fn payload(audio_url: &str, title: &str) -> PublishBeatPayload {
        PublishBeatPayload {
            audio_url: Some(audio_url.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Payload with every optional field set.
    pub fn full_payload(audio_url: &str, title: &str) -> PublishBeatPayload {
        PublishBeatPayload {
            tags: Some("trap, dark".to_string()),
            id: Some("song-42".to_string()),
            bpm: Some(140.0),
            key: Some("A minor".to_string()),
            ..payload(audio_url, title)
        }
    }
}
