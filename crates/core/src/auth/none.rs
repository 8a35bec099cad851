use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Caller};

/// Accepts every request as anonymous.
/// Must be explicitly configured with `method = "none"`.
#[derive(Debug, Default)]
pub struct NoneAuthenticator;

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Caller, AuthError> {
        Ok(Caller::anonymous())
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
