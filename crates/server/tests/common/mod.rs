//! Common test utilities for router tests with mocks.
//!
//! The fixture builds the real router over an orchestrator whose fetcher and
//! browser engine are mocks, so the whole HTTP contract can be exercised
//! in-process.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use beatpub_core::{
    create_authenticator, testing::fixtures, testing::MockBrowserEngine, testing::MockFetcher,
    AuthConfig, AuthMethod, Authenticator, Config, PublishOrchestrator,
};
use beatpub_server::{api::create_router, state::AppState};

/// Test fixture over the real router.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_publish() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/beats/publish", json!({
///         "audio_url": "https://x/a.wav",
///         "title": "Beat 1"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - control downloads
    pub fetcher: Arc<MockFetcher>,
    /// Mock browser - control the marketplace UI
    pub engine: Arc<MockBrowserEngine>,
    /// Effective configuration
    pub config: Config,
    /// Scratch directory used by the orchestrator
    pub scratch_dir: PathBuf,
    /// Keeps the scratch directory alive
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with no API authentication.
    pub fn new() -> Self {
        Self::build(|_| {}, Arc::new(MockFetcher::new()), MockBrowserEngine::new())
    }

    /// Fixture requiring `api_key` on protected routes.
    pub fn with_api_key(api_key: &str) -> Self {
        let api_key = api_key.to_string();
        Self::build(
            move |config| {
                config.auth = AuthConfig {
                    method: AuthMethod::ApiKey,
                    api_key: Some(api_key),
                }
            },
            Arc::new(MockFetcher::new()),
            MockBrowserEngine::new(),
        )
    }

    /// Fixture over pre-configured mocks and a config tweak.
    pub fn build(
        customize: impl FnOnce(&mut Config),
        fetcher: Arc<MockFetcher>,
        engine: MockBrowserEngine,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let scratch_dir = temp_dir.path().join("scratch");
        let mut config = fixtures::config(&scratch_dir);
        customize(&mut config);

        let engine = Arc::new(engine);
        let authenticator: Arc<dyn Authenticator> =
            Arc::from(create_authenticator(&config.auth).expect("authenticator"));
        let orchestrator = PublishOrchestrator::from_config(
            &config,
            Arc::clone(&fetcher) as _,
            Arc::clone(&engine) as _,
        );
        let state = Arc::new(AppState::new(
            config.clone(),
            authenticator,
            Arc::new(orchestrator),
        ));

        Self {
            router: create_router(state),
            fetcher,
            engine,
            config,
            scratch_dir,
            temp_dir,
        }
    }

    /// Whether no scratch file is left behind.
    pub fn scratch_is_empty(&self) -> bool {
        dir_is_empty(&self.scratch_dir)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(self.builder("GET", path).body(Body::empty()).unwrap())
            .await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = self.builder("GET", path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.post_with_headers(path, body, &[]).await
    }

    /// Send a POST request with JSON body and extra headers.
    pub async fn post_with_headers(
        &self,
        path: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = self
            .builder("POST", path)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with a raw body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = self
            .builder("POST", path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a GET request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(self.builder("GET", path).body(Body::empty()).unwrap())
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn builder(&self, method: &str, path: &str) -> axum::http::request::Builder {
        Request::builder().method(method).uri(path)
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

fn dir_is_empty(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
