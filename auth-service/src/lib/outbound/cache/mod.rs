pub mod memory;
pub mod redis;

pub use self::memory::InMemoryCredentialCache;
pub use self::redis::RedisCredentialCache;

use crate::credential::models::Username;

/// Cache key for a username: `login_cache_<sha256 hex of username>`.
pub fn cache_key(username: &Username) -> String {
    format!("login_cache_{}", username.fingerprint())
}
