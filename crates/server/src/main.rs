use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beatpub_core::{
    create_authenticator, load_config, validate_config, AssetFetcher, Authenticator,
    BrowserEngine, HttpFetcher, PublishOrchestrator, WebDriverEngine,
};
use beatpub_server::api::create_router;
use beatpub_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("BEATPUB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!(version = VERSION, "Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint of the effective config, without the secrets
    let sanitized = serde_json::to_string(&beatpub_core::SanitizedConfig::from(&config))
        .context("Failed to serialize config")?;
    let config_hash = format!("{:x}", Sha256::digest(sanitized.as_bytes()));

    info!(
        config_hash = &config_hash[..16],
        marketplace = %config.marketplace.name,
        browser = ?config.browser.kind,
        webdriver = %config.browser.webdriver_url,
        "Configuration loaded"
    );

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let fetcher: Arc<dyn AssetFetcher> = Arc::new(
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP client")?,
    );
    let engine: Arc<dyn BrowserEngine> = Arc::new(WebDriverEngine::new(&config.browser));

    let orchestrator = Arc::new(PublishOrchestrator::from_config(&config, fetcher, engine));
    info!(
        scratch_dir = %orchestrator.scratch_dir().root().display(),
        "Publish orchestrator ready"
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, authenticator, orchestrator));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
