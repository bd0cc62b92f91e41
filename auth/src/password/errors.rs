use thiserror::Error;

/// Failure while producing a stored digest.
///
/// Verification never errors; a digest that cannot be checked is a mismatch.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Key stretching failed: {0}")]
    HashingFailed(String),
}
