use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Caller};

/// Validates requests against a single configured API key.
///
/// The key is accepted from `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub struct ApiKeyAuthenticator {
    expected_key: String,
}

impl ApiKeyAuthenticator {
    pub fn new(api_key: String) -> Self {
        Self {
            expected_key: api_key,
        }
    }

    fn extract_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        if let Some(auth_header) = request.header("authorization") {
            let key = auth_header
                .strip_prefix("Bearer ")
                .or_else(|| auth_header.strip_prefix("bearer "));
            if key.is_some() {
                return key;
            }
        }
        request.header("x-api-key")
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Caller, AuthError> {
        let provided = self
            .extract_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        if constant_time_eq(provided.as_bytes(), self.expected_key.as_bytes()) {
            Ok(Caller {
                id: "api_key_user".to_string(),
                method: "api_key",
            })
        } else {
            Err(AuthError::InvalidCredentials("Invalid API key".to_string()))
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
