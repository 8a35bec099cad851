use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub selectors: SelectorsConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub scratch: ScratchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for the HTTP API
///
/// `method = "none"` (the usual setup) leaves every route open. With
/// `method = "api_key"`, `POST /api/v1/beats/publish` and `GET /api/v1/config`
/// answer 401 with an empty body when the key is missing or wrong, before
/// any validation, download or browser work. `GET /api/v1/health` and
/// `GET /metrics` stay open.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when method = "api_key"
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Marketplace account and surfaces.
///
/// The credentials are operator secrets: read once at startup and reused
/// for every publish request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketplaceConfig {
    /// Display name used in user-facing messages.
    #[serde(default = "default_marketplace_name")]
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// When set, login is confirmed by the current URL containing this
    /// fragment instead of by the post-login selector.
    #[serde(default)]
    pub post_login_url_contains: Option<String>,
}

fn default_marketplace_name() -> String {
    "Beatstars".to_string()
}

fn default_login_url() -> String {
    "https://www.beatstars.com/login".to_string()
}

fn default_upload_url() -> String {
    "https://studio.beatstars.com/content/tracks/upload".to_string()
}

/// CSS selectors for the marketplace controls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorsConfig {
    pub username: String,
    pub password: String,
    pub login_submit: String,
    pub post_login: String,
    pub file_input: String,
    pub title: String,
    pub tags: String,
    pub bpm: String,
    pub key: String,
    pub submit: String,
    /// Optional marker proving the marketplace accepted the upload.
    /// Without it, the settle delay alone counts as completion.
    pub confirmation: Option<String>,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            username: "input[name='email']".to_string(),
            password: "input[name='password']".to_string(),
            login_submit: "button[type='submit']".to_string(),
            post_login: "[data-qa='user-menu']".to_string(),
            file_input: "input[type='file']".to_string(),
            title: "input[name='title']".to_string(),
            tags: "input[name='tags']".to_string(),
            bpm: "input[name='bpm']".to_string(),
            key: "input[name='key']".to_string(),
            submit: "button[type='submit']".to_string(),
            confirmation: None,
        }
    }
}

/// Browser (WebDriver) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub kind: BrowserKind,
    /// WebDriver endpoint (chromedriver / geckodriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    /// Bound on every wait for a form control (seconds).
    #[serde(default = "default_element_timeout")]
    pub element_timeout_secs: u64,
    /// Bound on the wait for the post-login signal (seconds).
    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
    /// How often bounded waits re-check their condition (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Fixed delay after clicking submit (seconds).
    #[serde(default = "default_settle")]
    pub settle_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::default(),
            webdriver_url: default_webdriver_url(),
            headless: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            element_timeout_secs: default_element_timeout(),
            login_timeout_secs: default_login_timeout(),
            poll_interval_ms: default_poll_interval(),
            settle_secs: default_settle(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_true() -> bool {
    true
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_element_timeout() -> u64 {
    10
}

fn default_login_timeout() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    250
}

fn default_settle() -> u64 {
    5
}

/// Asset download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Write buffer size for the scratch file (bytes).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Reject assets larger than this (bytes). Unlimited when unset.
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            buffer_size: default_buffer_size(),
            max_size_bytes: None,
        }
    }
}

fn default_fetch_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_buffer_size() -> usize {
    64 * 1024
}

/// Scratch storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScratchConfig {
    /// Directory for request-scoped asset copies. Defaults to
    /// `<system temp>/beatpub`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub marketplace: SanitizedMarketplaceConfig,
    pub selectors: SelectorsConfig,
    pub browser: BrowserConfig,
    pub fetcher: FetcherConfig,
    pub scratch: ScratchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: AuthMethod,
    pub api_key_configured: bool,
}

/// Marketplace config with the password hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMarketplaceConfig {
    pub name: String,
    pub username: String,
    pub password_configured: bool,
    pub login_url: String,
    pub upload_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_login_url_contains: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method,
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            marketplace: SanitizedMarketplaceConfig {
                name: config.marketplace.name.clone(),
                username: config.marketplace.username.clone(),
                password_configured: !config.marketplace.password.is_empty(),
                login_url: config.marketplace.login_url.clone(),
                upload_url: config.marketplace.upload_url.clone(),
                post_login_url_contains: config.marketplace.post_login_url_contains.clone(),
            },
            selectors: config.selectors.clone(),
            browser: config.browser.clone(),
            fetcher: config.fetcher.clone(),
            scratch: config.scratch.clone(),
        }
    }
}
