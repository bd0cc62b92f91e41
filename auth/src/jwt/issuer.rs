use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::TokenClaims;
use super::errors::TokenError;
use super::handler::JwtHandler;

/// Issues signed, time-bounded tokens for authenticated users.
pub struct TokenIssuer {
    jwt_handler: Arc<JwtHandler>,
    lifetime: Duration,
}

impl TokenIssuer {
    /// # Arguments
    /// * `jwt_handler` - Handler holding the signing key
    /// * `lifetime` - Validity window of every issued token
    pub fn new(jwt_handler: Arc<JwtHandler>, lifetime: Duration) -> Self {
        Self {
            jwt_handler,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign a token for a verified identity.
    ///
    /// `iat` and `nbf` are set to `now`, `exp` to `now + lifetime`.
    ///
    /// # Errors
    /// * `SigningKeyMissing` - Handler cannot sign
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        user_id: impl ToString,
        username: impl Into<String>,
        permissions: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::for_user(user_id, username, permissions, now, self.lifetime);
        self.jwt_handler.encode(&claims)
    }
}
