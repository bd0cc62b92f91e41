use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::TokenError;

/// JWT codec for RS256-signed tokens.
///
/// Only checks signatures. Temporal claims are checked by
/// [`TokenGate`](super::TokenGate) against an explicit clock.
pub struct JwtHandler {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a handler able to sign and verify tokens.
    ///
    /// # Arguments
    /// * `private_key_pem` - RSA private key (PKCS#1 or PKCS#8 PEM)
    /// * `public_key_pem` - Matching RSA public key (PEM)
    ///
    /// # Errors
    /// * `InvalidKey` - Either key could not be parsed
    pub fn new(private_key_pem: &[u8], public_key_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key: {}", e)))?;

        Ok(Self {
            encoding_key: Some(encoding_key),
            ..Self::verifier(public_key_pem)?
        })
    }

    /// Create a verify-only handler for services that never issue tokens.
    ///
    /// # Errors
    /// * `InvalidKey` - Public key could not be parsed
    pub fn verifier(public_key_pem: &[u8]) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            encoding_key: None,
            decoding_key,
            algorithm: Algorithm::RS256,
        })
    }

    /// Sign claims into a compact JWT.
    ///
    /// # Errors
    /// * `SigningKeyMissing` - Handler was built with [`JwtHandler::verifier`]
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or(TokenError::SigningKeyMissing)?;

        encode(&Header::new(self.algorithm), claims, encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature of a token and decode its claims.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature or algorithm does not match
    /// * `Malformed` - Token is not a well-formed JWT or claims do not parse
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(map_decode_error)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../testdata/rsa_private.pem");
    const PUBLIC_KEY: &str = include_str!("../../testdata/rsa_public.pem");
    const OTHER_PUBLIC_KEY: &str = include_str!("../../testdata/rsa_other_public.pem");

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        role: String,
    }

    fn test_claims() -> TestClaims {
        TestClaims {
            sub: "user123".to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes())
            .expect("Failed to load keys");

        let token = handler.encode(&test_claims()).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, test_claims());
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::verifier(PUBLIC_KEY.as_bytes()).expect("Failed to load key");

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_decode_with_wrong_key() {
        let signer = JwtHandler::new(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes())
            .expect("Failed to load keys");
        let verifier =
            JwtHandler::verifier(OTHER_PUBLIC_KEY.as_bytes()).expect("Failed to load key");

        let token = signer.encode(&test_claims()).expect("Failed to encode token");

        let result = verifier.decode::<TestClaims>(&token);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_decode_rejects_symmetric_algorithm() {
        let verifier = JwtHandler::verifier(PUBLIC_KEY.as_bytes()).expect("Failed to load key");

        let forged = encode(
            &Header::new(Algorithm::HS256),
            &test_claims(),
            &EncodingKey::from_secret(PUBLIC_KEY.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = verifier.decode::<TestClaims>(&forged);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_verifier_cannot_sign() {
        let verifier = JwtHandler::verifier(PUBLIC_KEY.as_bytes()).expect("Failed to load key");

        let result = verifier.encode(&test_claims());
        assert_eq!(result, Err(TokenError::SigningKeyMissing));
    }

    #[test]
    fn test_invalid_key_material() {
        let result = JwtHandler::verifier(b"not a pem");
        assert!(matches!(result, Err(TokenError::InvalidKey(_))));

        let result = JwtHandler::new(b"not a pem", PUBLIC_KEY.as_bytes());
        assert!(matches!(result, Err(TokenError::InvalidKey(_))));
    }
}
