use thiserror::Error;

/// Error type for token issuance and validation.
///
/// Every validation error is terminal for the request that carried the
/// token; a new login is required.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token is not yet valid")]
    NotYetValid,

    #[error("Token is expired")]
    Expired,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("No signing key configured")]
    SigningKeyMissing,
}
