pub mod auth;
pub mod browser;
pub mod config;
pub mod fetcher;
pub mod metrics;
pub mod publisher;
pub mod scratch;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Caller,
    NoneAuthenticator,
};
pub use browser::{
    BrowserEngine, BrowserError, BrowserSession, SessionError, SessionOptions, WebDriverEngine,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, BrowserConfig,
    BrowserKind, Config, ConfigError, FetcherConfig, MarketplaceConfig, SanitizedConfig,
    ScratchConfig, SelectorsConfig, ServerConfig,
};
pub use fetcher::{AssetFetcher, FetchError, HttpFetcher};
pub use publisher::{
    Credentials, FailureReason, PublishBeatPayload, PublishError, PublishOrchestrator,
    PublishOutcome, PublishRequest, PublishSequencer, PublishStage, SequencerSettings,
    StageError, ValidationError,
};
pub use scratch::{ScratchDir, ScratchError, ScratchFile};
