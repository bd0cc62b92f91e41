use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;

/// Argon2id memory cost in KiB.
pub const MEMORY_COST: u32 = 19 * 1024;

/// Argon2id iterations.
pub const TIME_COST: u32 = 2;

/// Argon2id lanes.
pub const PARALLELISM: u32 = 1;

/// Raw digest length in bytes.
pub const DIGEST_LEN: usize = 64;

/// Raw salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Raw padding length in bytes.
pub const PADDING_LEN: usize = 160;

pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;
pub const SALT_HEX_LEN: usize = SALT_LEN * 2;
pub const PADDING_HEX_LEN: usize = PADDING_LEN * 2;

/// Total length of a stored digest: `digest_hex ‖ salt_hex ‖ padding_hex`.
pub const STORED_DIGEST_LEN: usize = DIGEST_HEX_LEN + SALT_HEX_LEN + PADDING_HEX_LEN;

/// Password hashing implementation.
///
/// Produces fixed-layout stored digests of exactly [`STORED_DIGEST_LEN`] hex
/// characters. The layout is:
///
/// | offset    | content                                   |
/// |-----------|-------------------------------------------|
/// | 0..128    | Argon2id digest of the password (hex)     |
/// | 128..192  | salt used for the digest (hex)            |
/// | 192..512  | random padding, ignored on verification   |
///
/// Work parameters are fixed protocol constants. Changing them invalidates
/// every stored digest.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Create a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password into a storable digest.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Stored digest string (512 lowercase hex characters)
    ///
    /// # Errors
    /// * `HashingFailed` - Key stretching primitive rejected its input
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut padding = [0u8; PADDING_LEN];
        OsRng.fill_bytes(&mut padding);

        let digest = stretch(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        let mut stored = String::with_capacity(STORED_DIGEST_LEN);
        stored.push_str(&hex::encode(digest));
        stored.push_str(&hex::encode(salt));
        stored.push_str(&hex::encode(padding));

        Ok(stored)
    }

    /// Verify a plaintext password against a stored digest.
    ///
    /// Returns false for any malformed stored digest.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_digest` - Digest previously produced by [`PasswordHasher::hash`]
    ///
    /// # Returns
    /// True if the password matches, false otherwise
    pub fn verify(&self, password: &str, stored_digest: &str) -> bool {
        let Some((expected, salt)) = split_stored_digest(stored_digest) else {
            return false;
        };

        match stretch(password.as_bytes(), &salt) {
            Ok(computed) => bool::from(computed[..].ct_eq(&expected[..])),
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn stretch(password: &[u8], salt: &[u8]) -> Result<[u8; DIGEST_LEN], argon2::Error> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(DIGEST_LEN))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; DIGEST_LEN];
    argon2.hash_password_into(password, salt, &mut output)?;
    Ok(output)
}

/// Split a stored digest into its raw digest and salt bytes.
///
/// Offsets are fixed, so the padding segment is never inspected beyond
/// checking that it is hex.
fn split_stored_digest(stored_digest: &str) -> Option<([u8; DIGEST_LEN], [u8; SALT_LEN])> {
    if stored_digest.len() != STORED_DIGEST_LEN
        || !stored_digest.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return None;
    }

    let mut digest = [0u8; DIGEST_LEN];
    let mut salt = [0u8; SALT_LEN];
    hex::decode_to_slice(&stored_digest[..DIGEST_HEX_LEN], &mut digest).ok()?;
    hex::decode_to_slice(
        &stored_digest[DIGEST_HEX_LEN..DIGEST_HEX_LEN + SALT_HEX_LEN],
        &mut salt,
    )
    .ok()?;

    Some((digest, salt))
}
