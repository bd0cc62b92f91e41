use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username is empty")]
    Empty,

    #[error("Username too long: maximum {max} bytes, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for credential cache operations
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Credential cache unavailable: {0}")]
    Unavailable(String),

    #[error("Credential cache entry could not be (de)serialized: {0}")]
    Serialization(String),
}

/// Top-level error for login, token and account operations
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Wrong password, unknown username and unusable username all collapse here.
    #[error("Invalid login")]
    InvalidCredentials,

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token issuance failed: {0}")]
    TokenIssuanceFailed(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
