use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::credential::errors::CredentialError;
use crate::credential::errors::UserIdError;
use crate::credential::errors::UsernameError;

/// Credential record as held by the persistent store.
///
/// Read-only to the login flow. One record per username.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub user_id: UserId,
    pub username: Username,
    pub stored_digest: String,
    pub display_name: String,
    pub permissions: Vec<String>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Only bounds the length; login must not reveal anything else about
/// which usernames could exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MAX_LENGTH: usize = 255;

    /// Create a new username.
    ///
    /// # Errors
    /// * `Empty` - Username is empty
    /// * `TooLong` - Username longer than 255 bytes
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.len();
        if length == 0 {
            Err(UsernameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SHA-256 hex of the username, safe to log and to key caches with.
    pub fn fingerprint(&self) -> String {
        auth::username_fingerprint(&self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username and plaintext password presented at login.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: Username,
    password: String,
}

impl LoginCredentials {
    pub fn new(username: Username, password: String) -> Self {
        Self { username, password }
    }

    /// Build credentials from raw, possibly absent request fields.
    ///
    /// Absent fields are a `MissingParameter`. A present but unusable
    /// username is reported exactly like a wrong password.
    ///
    /// # Errors
    /// * `MissingParameter` - `username` or `password` is absent
    /// * `InvalidCredentials` - Username is empty or too long
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, CredentialError> {
        let username = username.ok_or(CredentialError::MissingParameter("username"))?;
        let password = password.ok_or(CredentialError::MissingParameter("password"))?;
        let username = Username::new(username).map_err(|_| CredentialError::InvalidCredentials)?;

        Ok(Self::new(username, password))
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn into_password(self) -> String {
        self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Last-known verified login material for a username.
///
/// Serialized as JSON into the credential cache. Holds a password
/// fingerprint, never the plaintext or the stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub username: String,
    pub password_digest_fingerprint: String,
    pub display_name: String,
    pub user_id: UserId,
    pub permissions: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check the presented credentials against this entry.
    pub fn matches(&self, credentials: &LoginCredentials) -> bool {
        self.username == credentials.username.as_str()
            && auth::verify_password_fingerprint(
                &self.password_digest_fingerprint,
                credentials.username.as_str(),
                credentials.password(),
            )
    }
}

/// Identity established by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub permissions: Vec<String>,
}

impl From<CacheEntry> for AuthenticatedIdentity {
    fn from(entry: CacheEntry) -> Self {
        Self {
            user_id: entry.user_id,
            username: entry.username,
            display_name: entry.display_name,
            permissions: entry.permissions,
        }
    }
}

impl From<CredentialRecord> for AuthenticatedIdentity {
    fn from(record: CredentialRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username.as_str().to_string(),
            display_name: record.display_name,
            permissions: record.permissions,
        }
    }
}

/// Where the credentials for a successful login were checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cache,
    Database,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub identity: AuthenticatedIdentity,
    pub source: CredentialSource,
}

/// Public view of a user's account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: Username,
    pub display_name: String,
    pub permissions: Vec<String>,
}

impl From<CredentialRecord> for UserProfile {
    fn from(record: CredentialRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            display_name: record.display_name,
            permissions: record.permissions,
        }
    }
}

/// Command to replace a user's password.
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordCommand {
    /// # Errors
    /// * `MissingParameter` - `current_password` or `new_password` is absent
    pub fn from_parts(
        current_password: Option<String>,
        new_password: Option<String>,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            current_password: current_password
                .ok_or(CredentialError::MissingParameter("current_password"))?,
            new_password: new_password.ok_or(CredentialError::MissingParameter("new_password"))?,
        })
    }
}
