use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::JwtHandler;
use crate::jwt::TokenClaims;
use crate::jwt::TokenError;
use crate::jwt::TokenGate;
use crate::jwt::TokenIssuer;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
    token_gate: TokenGate,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `private_key_pem` - RSA private key used to sign tokens
    /// * `public_key_pem` - Matching RSA public key used to verify tokens
    /// * `token_lifetime` - Validity window of issued tokens
    ///
    /// # Errors
    /// * `InvalidKey` - Key material could not be parsed
    pub fn new(
        private_key_pem: &[u8],
        public_key_pem: &[u8],
        token_lifetime: Duration,
    ) -> Result<Self, TokenError> {
        let jwt_handler = Arc::new(JwtHandler::new(private_key_pem, public_key_pem)?);

        Ok(Self {
            password_hasher: PasswordHasher::new(),
            token_issuer: TokenIssuer::new(Arc::clone(&jwt_handler), token_lifetime),
            token_gate: TokenGate::new(jwt_handler),
        })
    }

    /// Hash a password for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored digest. Fails closed.
    pub fn verify_password(&self, password: &str, stored_digest: &str) -> bool {
        self.password_hasher.verify(password, stored_digest)
    }

    /// Issue a token for an identity whose credentials were already checked,
    /// against either the stored digest or a matching cached credential.
    pub fn issue_token(
        &self,
        user_id: impl ToString,
        username: impl Into<String>,
        permissions: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.token_issuer.issue(user_id, username, permissions, now)
    }

    /// Validate a bearer token at time `now`.
    pub fn validate_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        self.token_gate.validate(token, now)
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_issuer.lifetime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = include_str!("../testdata/rsa_private.pem");
    const PUBLIC_KEY: &str = include_str!("../testdata/rsa_public.pem");

    fn authenticator() -> Authenticator {
        Authenticator::new(
            PRIVATE_KEY.as_bytes(),
            PUBLIC_KEY.as_bytes(),
            Duration::hours(1),
        )
        .expect("Failed to build authenticator")
    }

    #[test]
    fn test_verify_then_issue() {
        let authenticator = authenticator();
        let now = Utc::now();

        let stored = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");
        assert!(authenticator.verify_password("my_password", &stored));
        assert!(!authenticator.verify_password("wrong_password", &stored));

        let token = authenticator
            .issue_token("user123", "alice", vec!["read".to_string()], now)
            .expect("Failed to issue token");
        let claims = authenticator
            .validate_token(&token, now)
            .expect("Token validation failed");
        assert_eq!(claims.user_uuid, "user123");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.user_permissions, vec!["read"]);
    }

    #[test]
    fn test_verify_malformed_digest() {
        let authenticator = authenticator();
        assert!(!authenticator.verify_password("my_password", "$argon2id$v=19$not-our-layout"));
    }

    #[test]
    fn test_issued_token_expires() {
        let authenticator = authenticator();
        let now = Utc::now();

        let token = authenticator
            .issue_token("user123", "alice", vec![], now)
            .expect("Failed to issue token");

        let later = now + authenticator.token_lifetime();
        assert_eq!(
            authenticator.validate_token(&token, later),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator();

        let result = authenticator.validate_token("invalid.token.here", Utc::now());
        assert!(result.is_err());
    }
}
