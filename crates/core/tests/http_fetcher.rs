//! HttpFetcher tests against a local axum server.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};
use tempfile::TempDir;

use beatpub_core::{AssetFetcher, FetchError, FetcherConfig, HttpFetcher};

const BODY: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt fake audio payload";

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/beat.wav", get(|| async { BODY.to_vec() }))
        .route("/missing.wav", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/broken.wav",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_fetch_writes_body_to_destination() {
    let addr = spawn_server().await;
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("asset.wav");

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let written = fetcher
        .fetch(&format!("http://{}/beat.wav", addr), &destination)
        .await
        .unwrap();

    assert_eq!(written, BODY.len() as u64);
    assert_eq!(std::fs::read(&destination).unwrap(), BODY);
}

#[tokio::test]
async fn test_fetch_small_buffer_still_writes_everything() {
    let addr = spawn_server().await;
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("asset.wav");

    let fetcher = HttpFetcher::new(FetcherConfig {
        buffer_size: 4,
        ..Default::default()
    })
    .unwrap();
    fetcher
        .fetch(&format!("http://{}/beat.wav", addr), &destination)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&destination).unwrap(), BODY);
}

#[tokio::test]
async fn test_fetch_not_found_is_status_error() {
    let addr = spawn_server().await;
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("asset.wav");

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let result = fetcher
        .fetch(&format!("http://{}/missing.wav", addr), &destination)
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 404 })));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_fetch_server_error_is_status_error() {
    let addr = spawn_server().await;
    let temp = TempDir::new().unwrap();

    let fetcher = HttpFetcher::with_defaults().unwrap();
    let result = fetcher
        .fetch(
            &format!("http://{}/broken.wav", addr),
            &temp.path().join("asset.wav"),
        )
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 500 })));
}

#[tokio::test]
async fn test_fetch_rejects_oversized_asset() {
    let addr = spawn_server().await;
    let temp = TempDir::new().unwrap();

    let fetcher = HttpFetcher::new(FetcherConfig {
        max_size_bytes: Some(8),
        ..Default::default()
    })
    .unwrap();
    let result = fetcher
        .fetch(
            &format!("http://{}/beat.wav", addr),
            &temp.path().join("asset.wav"),
        )
        .await;

    assert!(matches!(
        result,
        Err(FetchError::TooLarge { limit: 8, .. })
    ));
}

#[tokio::test]
async fn test_fetch_rejects_non_http_scheme() {
    let temp = TempDir::new().unwrap();
    let fetcher = HttpFetcher::with_defaults().unwrap();

    let result = fetcher
        .fetch("file:///etc/passwd", &temp.path().join("asset.wav"))
        .await;
    assert!(matches!(result, Err(FetchError::InvalidUrl(_))));

    let result = fetcher
        .fetch("not a url", &temp.path().join("asset.wav"))
        .await;
    assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_fetch_unreachable_host_is_request_error() {
    let temp = TempDir::new().unwrap();
    let fetcher = HttpFetcher::with_defaults().unwrap();

    let result = fetcher
        .fetch("http://127.0.0.1:1/beat.wav", &temp.path().join("asset.wav"))
        .await;
    assert!(matches!(result, Err(FetchError::Request(_))));
}
