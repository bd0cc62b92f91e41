use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Claims carried by every bearer token.
///
/// Field names are part of the wire format and shared with other services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    pub username: String,

    /// Stable user identifier
    pub user_uuid: String,

    pub user_permissions: Vec<String>,
}

impl TokenClaims {
    /// Build claims for a freshly authenticated user.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `username` - Username
    /// * `permissions` - Permission names granted to the user
    /// * `now` - Issue time; also used as `nbf`
    /// * `lifetime` - Duration until the token expires
    pub fn for_user(
        user_id: impl ToString,
        username: impl Into<String>,
        permissions: Vec<String>,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let issued_at = now.timestamp();

        Self {
            iat: issued_at,
            nbf: issued_at,
            exp: (now + lifetime).timestamp(),
            username: username.into(),
            user_uuid: user_id.to_string(),
            user_permissions: permissions,
        }
    }

    /// Check if the token is expired. A token expires at `exp` itself.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// Check if the token is used before its `nbf` time.
    pub fn is_not_yet_valid(&self, current_timestamp: i64) -> bool {
        self.nbf > current_timestamp
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.user_permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_for_user() {
        let claims = TokenClaims::for_user(
            "3f1c7a56-2f61-4e0b-9a55-0d3c7b1e9f00",
            "alice",
            vec!["read".to_string()],
            fixed_now(),
            Duration::hours(1),
        );

        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.nbf, 1_700_000_000);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.user_uuid, "3f1c7a56-2f61-4e0b-9a55-0d3c7b1e9f00");
        assert!(claims.has_permission("read"));
        assert!(!claims.has_permission("write"));
    }

    #[test]
    fn test_wire_format() {
        let claims =
            TokenClaims::for_user("uid", "alice", vec![], fixed_now(), Duration::seconds(10));
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "iat": 1_700_000_000,
                "nbf": 1_700_000_000,
                "exp": 1_700_000_010,
                "username": "alice",
                "user_uuid": "uid",
                "user_permissions": []
            })
        );
    }

    #[test]
    fn test_temporal_checks() {
        let claims =
            TokenClaims::for_user("uid", "alice", vec![], fixed_now(), Duration::seconds(100));

        assert!(claims.is_not_yet_valid(1_699_999_999));
        assert!(!claims.is_not_yet_valid(1_700_000_000));

        assert!(!claims.is_expired(1_700_000_099));
        assert!(claims.is_expired(1_700_000_100)); // Exactly at expiration
        assert!(claims.is_expired(1_700_000_101));
    }
}
