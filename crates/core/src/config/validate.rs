use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration.
///
/// Rejects settings the publish pipeline cannot run with: port 0, missing
/// marketplace credentials or URLs, zero waits, a zero viewport, and
/// API-key auth without a key.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().is_none_or(str::is_empty)
    {
        return invalid("auth.api_key must be set when auth.method = \"api_key\"");
    }

    let marketplace = &config.marketplace;
    if marketplace.username.trim().is_empty() {
        return invalid("marketplace.username cannot be empty");
    }
    if marketplace.password.is_empty() {
        return invalid("marketplace.password cannot be empty");
    }
    if marketplace.login_url.trim().is_empty() {
        return invalid("marketplace.login_url cannot be empty");
    }
    if marketplace.upload_url.trim().is_empty() {
        return invalid("marketplace.upload_url cannot be empty");
    }

    let browser = &config.browser;
    if browser.webdriver_url.trim().is_empty() {
        return invalid("browser.webdriver_url cannot be empty");
    }
    if browser.viewport_width == 0 || browser.viewport_height == 0 {
        return invalid("browser viewport dimensions must be positive");
    }
    if browser.element_timeout_secs == 0 || browser.login_timeout_secs == 0 {
        return invalid("browser wait timeouts must be positive");
    }
    if browser.poll_interval_ms == 0 {
        return invalid("browser.poll_interval_ms cannot be 0");
    }

    if config.fetcher.buffer_size == 0 {
        return invalid("fetcher.buffer_size cannot be 0");
    }
    if config.fetcher.timeout_secs == 0 {
        return invalid("fetcher.timeout_secs cannot be 0");
    }

    Ok(())
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.to_string()))
}
