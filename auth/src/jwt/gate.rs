use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use super::claims::TokenClaims;
use super::errors::TokenError;
use super::handler::JwtHandler;

/// Single enforcement point for bearer tokens.
///
/// Checks the signature first, then `nbf`, then `exp`. Performs no I/O.
pub struct TokenGate {
    jwt_handler: Arc<JwtHandler>,
}

impl TokenGate {
    pub fn new(jwt_handler: Arc<JwtHandler>) -> Self {
        Self { jwt_handler }
    }

    /// Validate a bearer token at time `now`.
    ///
    /// # Returns
    /// Claims of a token with a valid signature and `nbf <= now < exp`
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature does not verify against the public key
    /// * `Malformed` - Token or claims could not be decoded
    /// * `NotYetValid` - `nbf` is after `now`
    /// * `Expired` - `exp` is at or before `now`
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims: TokenClaims = self.jwt_handler.decode(token)?;
        let now = now.timestamp();

        if claims.is_not_yet_valid(now) {
            return Err(TokenError::NotYetValid);
        }

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;

    use super::*;
    use crate::jwt::TokenIssuer;

    const PRIVATE_KEY: &str = include_str!("../../testdata/rsa_private.pem");
    const PUBLIC_KEY: &str = include_str!("../../testdata/rsa_public.pem");
    const OTHER_PUBLIC_KEY: &str = include_str!("../../testdata/rsa_other_public.pem");

    fn handler() -> Arc<JwtHandler> {
        Arc::new(
            JwtHandler::new(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes())
                .expect("Failed to load keys"),
        )
    }

    fn at(timestamp: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(timestamp, 0).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let handler = handler();
        let issuer = TokenIssuer::new(handler.clone(), Duration::hours(1));
        let gate = TokenGate::new(handler);
        let now = at(1_700_000_000);

        let token = issuer
            .issue("uid-1", "alice", vec!["read".to_string(), "write".to_string()], now)
            .expect("Failed to issue token");
        let claims = gate.validate(&token, now).expect("Token should be valid");

        assert_eq!(
            claims,
            TokenClaims {
                iat: 1_700_000_000,
                nbf: 1_700_000_000,
                exp: 1_700_003_600,
                username: "alice".to_string(),
                user_uuid: "uid-1".to_string(),
                user_permissions: vec!["read".to_string(), "write".to_string()],
            }
        );
    }

    #[test]
    fn test_validity_window() {
        let handler = handler();
        let issuer = TokenIssuer::new(handler.clone(), Duration::seconds(100));
        let gate = TokenGate::new(handler);

        let token = issuer
            .issue("uid-1", "alice", vec![], at(1_000))
            .expect("Failed to issue token");

        assert_eq!(gate.validate(&token, at(999)), Err(TokenError::NotYetValid));
        assert!(gate.validate(&token, at(1_000)).is_ok());
        assert!(gate.validate(&token, at(1_099)).is_ok());
        assert_eq!(gate.validate(&token, at(1_100)), Err(TokenError::Expired));
        assert_eq!(gate.validate(&token, at(5_000)), Err(TokenError::Expired));
    }

    #[test]
    fn test_future_token_is_not_yet_valid() {
        let handler = handler();
        let now = at(1_700_000_000);

        let claims = TokenClaims {
            iat: now.timestamp(),
            nbf: now.timestamp() + 3600,
            exp: now.timestamp() + 7200,
            username: "alice".to_string(),
            user_uuid: "uid-1".to_string(),
            user_permissions: vec![],
        };
        let token = handler.encode(&claims).expect("Failed to encode token");

        let gate = TokenGate::new(handler);
        assert_eq!(gate.validate(&token, now), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_signature_checked_before_time() {
        let issuer = TokenIssuer::new(handler(), Duration::seconds(10));
        let token = issuer
            .issue("uid-1", "alice", vec![], at(1_000))
            .expect("Failed to issue token");

        let gate = TokenGate::new(Arc::new(
            JwtHandler::verifier(OTHER_PUBLIC_KEY.as_bytes()).expect("Failed to load key"),
        ));
        assert_eq!(
            gate.validate(&token, at(9_999)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload() {
        let handler = handler();
        let issuer = TokenIssuer::new(handler.clone(), Duration::hours(1));
        let gate = TokenGate::new(handler.clone());
        let now = at(1_700_000_000);

        let token = issuer
            .issue("uid-1", "alice", vec![], now)
            .expect("Failed to issue token");
        let forged_claims = handler
            .encode(&TokenClaims::for_user(
                "uid-1",
                "alice",
                vec!["admin".to_string()],
                now,
                Duration::hours(1),
            ))
            .expect("Failed to encode token");

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_claims.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(gate.validate(&spliced, now), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_missing_claims_are_malformed() {
        let handler = handler();
        let token = handler
            .encode(&serde_json::json!({ "username": "alice" }))
            .expect("Failed to encode token");

        let gate = TokenGate::new(handler);
        assert!(matches!(
            gate.validate(&token, Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
