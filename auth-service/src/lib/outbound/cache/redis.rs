use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use ::redis::Client;
use ::redis::RedisError;
use async_trait::async_trait;

use super::cache_key;
use crate::credential::errors::CacheError;
use crate::credential::models::CacheEntry;
use crate::credential::models::Username;
use crate::credential::ports::CredentialCache;

/// Value stored by `invalidate` in place of an entry.
const INVALIDATED: &str = "invalidated";

/// Redis-backed credential cache shared by every service instance.
///
/// Entries are JSON strings under `login_cache_<username fingerprint>` and
/// expire server side. Every command is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisCredentialCache {
    connection: ConnectionManager,
    timeout: Duration,
}

impl RedisCredentialCache {
    /// Connect to Redis.
    ///
    /// # Arguments
    /// * `url` - Redis URL, e.g. `redis://localhost:6379/0`
    /// * `timeout` - Bound on connecting and on each command
    ///
    /// # Errors
    /// * `Unavailable` - URL invalid or server unreachable
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(unavailable)?;
        let connection = bounded(timeout, ConnectionManager::new(client)).await?;

        tracing::info!(cache = "redis", "Credential cache connected");
        Ok(Self {
            connection,
            timeout,
        })
    }
}

#[async_trait]
impl CredentialCache for RedisCredentialCache {
    async fn get(&self, username: &Username) -> Result<Option<CacheEntry>, CacheError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> =
            bounded(self.timeout, connection.get(cache_key(username))).await?;

        match raw {
            Some(raw) => decode_entry(&raw),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        username: &Username,
        entry: &CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json = encode_entry(entry)?;
        let mut connection = self.connection.clone();

        // NX: never replace a live entry or an invalidation marker
        let command = ::redis::cmd("SET")
            .arg(cache_key(username))
            .arg(json)
            .arg("EX")
            .arg(expiry_seconds(ttl))
            .arg("NX")
            .to_owned();

        bounded(self.timeout, command.query_async::<_, ()>(&mut connection)).await
    }

    async fn invalidate(&self, username: &Username, hold: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        bounded(
            self.timeout,
            connection.set_ex::<_, _, ()>(cache_key(username), INVALIDATED, expiry_seconds(hold)),
        )
        .await
    }
}

fn encode_entry(entry: &CacheEntry) -> Result<String, CacheError> {
    serde_json::to_string(entry).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn decode_entry(raw: &str) -> Result<Option<CacheEntry>, CacheError> {
    if raw == INVALIDATED {
        return Ok(None);
    }

    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Whole seconds for `EX`, rounded up. Redis rejects an expiry of zero.
fn expiry_seconds(ttl: Duration) -> u64 {
    let seconds = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    seconds.max(1)
}

async fn bounded<T, F>(timeout: Duration, command: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(timeout, command).await {
        Ok(result) => result.map_err(unavailable),
        Err(_) => Err(CacheError::Unavailable(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

fn unavailable(error: RedisError) -> CacheError {
    CacheError::Unavailable(error.to_string())
}
