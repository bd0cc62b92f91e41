use std::time::Duration;

use async_trait::async_trait;
use auth::TokenClaims;
use chrono::DateTime;
use chrono::Utc;

use crate::credential::errors::CacheError;
use crate::credential::errors::CredentialError;
use crate::credential::models::CacheEntry;
use crate::credential::models::ChangePasswordCommand;
use crate::credential::models::CredentialRecord;
use crate::credential::models::LoginCredentials;
use crate::credential::models::LoginOutcome;
use crate::credential::models::UserId;
use crate::credential::models::UserProfile;
use crate::credential::models::Username;

/// Port for login and account operations.
#[async_trait]
pub trait LoginServicePort: Send + Sync + 'static {
    /// Check credentials and issue an access token.
    ///
    /// Consults the credential cache first and falls back to the
    /// persistent store on a miss.
    ///
    /// # Arguments
    /// * `credentials` - Username and plaintext password
    /// * `now` - Issuance instant
    ///
    /// # Returns
    /// Signed token, the authenticated identity and where it was checked
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown username or wrong password
    /// * `DependencyUnavailable` - Persistent store could not be reached
    /// * `TokenIssuanceFailed` - Signing failed
    async fn login(
        &self,
        credentials: LoginCredentials,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, CredentialError>;

    /// Verify a bearer token and return its claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Bad signature, malformed, not yet valid or expired
    fn validate_token(&self, token: &str, now: DateTime<Utc>)
        -> Result<TokenClaims, CredentialError>;

    /// Retrieve the account behind a user ID.
    ///
    /// # Errors
    /// * `NotFound` - No such user
    /// * `DependencyUnavailable` - Persistent store could not be reached
    async fn get_profile(&self, id: &UserId) -> Result<UserProfile, CredentialError>;

    /// Replace a user's password after checking the current one.
    ///
    /// Drops any cached credentials for the user.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password does not match
    /// * `NotFound` - No such user
    /// * `DependencyUnavailable` - Persistent store could not be reached
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), CredentialError>;
}

/// Persistence operations for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Look up the unique credential record for a username.
    ///
    /// Anything other than exactly one matching record is `None`.
    async fn find_credential_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<CredentialRecord>, CredentialError>;

    async fn find_credential_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<CredentialRecord>, CredentialError>;

    /// # Errors
    /// * `NotFound` - No such user
    async fn update_stored_digest(
        &self,
        id: &UserId,
        stored_digest: &str,
    ) -> Result<(), CredentialError>;
}

/// Shared, expiring store of verified login material.
///
/// Callers treat every error as a cache miss.
#[async_trait]
pub trait CredentialCache: Send + Sync + 'static {
    async fn get(&self, username: &Username) -> Result<Option<CacheEntry>, CacheError>;

    /// Store an entry for `ttl` unless a live value already occupies the key.
    async fn put(
        &self,
        username: &Username,
        entry: &CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Drop the entry for a username and refuse new ones for `hold`.
    ///
    /// While the hold lasts `get` reports a miss and `put` is a no-op, so a
    /// login that read the record before the change cannot repopulate it.
    async fn invalidate(&self, username: &Username, hold: Duration) -> Result<(), CacheError>;
}
