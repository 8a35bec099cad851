//! API authentication for the publish endpoint.
//!
//! The marketplace credentials never pass through here; this only decides
//! whether an HTTP caller may trigger a publish.

mod api_key;
mod none;

pub use api_key::ApiKeyAuthenticator;
pub use none::NoneAuthenticator;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Request headers relevant to authentication, names lowercased.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Who is calling the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub method: &'static str,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self {
            id: "anonymous".to_string(),
            method: "none",
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the caller
    async fn authenticate(&self, request: &AuthRequest) -> Result<Caller, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}

/// Build the authenticator selected in config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator)),
        AuthMethod::ApiKey => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    AuthError::ConfigurationError(
                        "api_key must be set when using api_key auth".to_string(),
                    )
                })?;
            Ok(Box::new(ApiKeyAuthenticator::new(api_key)))
        }
    }
}
