use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::password::STORED_DIGEST_LEN;
use auth::Authenticator;
use auth::TokenClaims;
use chrono::DateTime;
use chrono::Utc;

use crate::credential::errors::CredentialError;
use crate::credential::models::AuthenticatedIdentity;
use crate::credential::models::CacheEntry;
use crate::credential::models::ChangePasswordCommand;
use crate::credential::models::CredentialRecord;
use crate::credential::models::CredentialSource;
use crate::credential::models::LoginCredentials;
use crate::credential::models::LoginOutcome;
use crate::credential::models::UserId;
use crate::credential::models::UserProfile;
use crate::credential::ports::CredentialCache;
use crate::credential::ports::CredentialStore;
use crate::credential::ports::LoginServicePort;

/// Domain service for login and account operations.
///
/// Checks credentials against the cache first, then the store. The cache
/// is only written after a digest verification against the store
/// succeeded.
pub struct LoginService<CS, CC>
where
    CS: CredentialStore,
    CC: CredentialCache,
{
    store: Arc<CS>,
    cache: Arc<CC>,
    authenticator: Arc<Authenticator>,
    cache_ttl: Duration,
}

impl<CS, CC> LoginService<CS, CC>
where
    CS: CredentialStore,
    CC: CredentialCache,
{
    /// Create a new login service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Persistent credential store
    /// * `cache` - Shared credential cache
    /// * `authenticator` - Password and token primitives
    /// * `cache_ttl` - Lifetime of cache entries
    pub fn new(
        store: Arc<CS>,
        cache: Arc<CC>,
        authenticator: Arc<Authenticator>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            authenticator,
            cache_ttl,
        }
    }

    /// Look up a live cache entry. Errors and expired entries count as a miss.
    async fn cached_entry(
        &self,
        credentials: &LoginCredentials,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry> {
        match self.cache.get(&credentials.username).await {
            Ok(Some(entry)) if !entry.is_expired(now) => Some(entry),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    "Credential cache lookup failed for {}, falling back to store: {}",
                    credentials.username.fingerprint(),
                    e
                );
                None
            }
        }
    }

    async fn login_from_store(
        &self,
        credentials: LoginCredentials,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, CredentialError> {
        let record = self
            .store
            .find_credential_by_username(&credentials.username)
            .await?;

        let Some(record) = record else {
            // Burn the same hashing work as a real check.
            let password = credentials.into_password();
            let authenticator = Arc::clone(&self.authenticator);
            run_blocking(move || {
                authenticator.verify_password(&password, &"0".repeat(STORED_DIGEST_LEN))
            })
            .await?;
            return Err(CredentialError::InvalidCredentials);
        };

        let password = credentials.password().to_string();
        let stored_digest = record.stored_digest.clone();
        let authenticator = Arc::clone(&self.authenticator);
        let verified =
            run_blocking(move || authenticator.verify_password(&password, &stored_digest)).await?;

        if !verified {
            return Err(CredentialError::InvalidCredentials);
        }

        self.remember(&credentials, &record, now).await;

        let identity = AuthenticatedIdentity::from(record);
        let token = self.issue(&identity, now)?;

        Ok(LoginOutcome {
            token,
            identity,
            source: CredentialSource::Database,
        })
    }

    /// Write-through after a verified store login. Failures are logged only.
    async fn remember(
        &self,
        credentials: &LoginCredentials,
        record: &CredentialRecord,
        now: DateTime<Utc>,
    ) {
        let ttl = chrono::Duration::from_std(self.cache_ttl).unwrap_or(chrono::Duration::hours(1));
        let entry = CacheEntry {
            username: record.username.as_str().to_string(),
            password_digest_fingerprint: auth::password_fingerprint(
                credentials.username.as_str(),
                credentials.password(),
            ),
            display_name: record.display_name.clone(),
            user_id: record.user_id,
            permissions: record.permissions.clone(),
            expires_at: now + ttl,
        };

        if let Err(e) = self
            .cache
            .put(&record.username, &entry, self.cache_ttl)
            .await
        {
            tracing::warn!(
                "Failed to cache credentials for {}: {}",
                record.username.fingerprint(),
                e
            );
        }
    }

    fn issue(
        &self,
        identity: &AuthenticatedIdentity,
        now: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        self.authenticator
            .issue_token(
                identity.user_id,
                identity.username.clone(),
                identity.permissions.clone(),
                now,
            )
            .map_err(|e| CredentialError::TokenIssuanceFailed(e.to_string()))
    }
}

#[async_trait]
impl<CS, CC> LoginServicePort for LoginService<CS, CC>
where
    CS: CredentialStore,
    CC: CredentialCache,
{
    async fn login(
        &self,
        credentials: LoginCredentials,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, CredentialError> {
        if let Some(entry) = self.cached_entry(&credentials, now).await {
            // A stale cached password is not retried against the store.
            if !entry.matches(&credentials) {
                tracing::info!(
                    user = %credentials.username.fingerprint(),
                    source = "cache",
                    "Login rejected"
                );
                return Err(CredentialError::InvalidCredentials);
            }

            let identity = AuthenticatedIdentity::from(entry);
            let token = self.issue(&identity, now)?;
            tracing::info!(
                user_id = %identity.user_id,
                source = "cache",
                "Login succeeded"
            );

            return Ok(LoginOutcome {
                token,
                identity,
                source: CredentialSource::Cache,
            });
        }

        let user = credentials.username.fingerprint();
        let outcome = self.login_from_store(credentials, now).await;
        match &outcome {
            Ok(outcome) => tracing::info!(
                user_id = %outcome.identity.user_id,
                source = "database",
                "Login succeeded"
            ),
            Err(CredentialError::InvalidCredentials) => {
                tracing::info!(user = %user, source = "database", "Login rejected")
            }
            Err(e) => tracing::error!(user = %user, error = %e, "Login failed"),
        }

        outcome
    }

    fn validate_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, CredentialError> {
        Ok(self.authenticator.validate_token(token, now)?)
    }

    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, CredentialError> {
        self.store
            .find_credential_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or(CredentialError::NotFound(id.to_string()))
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), CredentialError> {
        let record = self
            .store
            .find_credential_by_id(id)
            .await?
            .ok_or(CredentialError::NotFound(id.to_string()))?;

        let authenticator = Arc::clone(&self.authenticator);
        let stored_digest = record.stored_digest.clone();
        let new_digest = run_blocking(move || -> Result<String, CredentialError> {
            if !authenticator.verify_password(&command.current_password, &stored_digest) {
                return Err(CredentialError::InvalidCredentials);
            }
            Ok(authenticator.hash_password(&command.new_password)?)
        })
        .await??;

        self.store.update_stored_digest(id, &new_digest).await?;

        // Held for one cache lifetime: an entry written by a login that read
        // the old digest would have expired by the time the hold lifts.
        if let Err(e) = self
            .cache
            .invalidate(&record.username, self.cache_ttl)
            .await
        {
            tracing::warn!(
                "Failed to invalidate cached credentials for {}: {}",
                record.username.fingerprint(),
                e
            );
        }

        tracing::info!("Password changed for user {}", id);
        Ok(())
    }
}

/// Run CPU-bound hashing off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T, CredentialError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CredentialError::Unknown(format!("Hashing task failed: {}", e)))
}
