//! Authentication utilities library
//!
//! Provides the credential and token primitives shared by services:
//! - Password hashing into fixed-layout salted digests (Argon2id)
//! - Username and password fingerprints for cache keys
//! - RS256 token issuance and validation
//! - An `Authenticator` facade over all of the above
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let stored = hasher.hash("my_password").unwrap();
//! assert_eq!(stored.len(), 512);
//! assert!(hasher.verify("my_password", &stored));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//! use chrono::{Duration, Utc};
//!
//! let private_key = include_str!(concat!(
//!     env!("CARGO_MANIFEST_DIR"),
//!     "/testdata/rsa_private.pem"
//! ));
//! let public_key = include_str!(concat!(
//!     env!("CARGO_MANIFEST_DIR"),
//!     "/testdata/rsa_public.pem"
//! ));
//! let auth = Authenticator::new(
//!     private_key.as_bytes(),
//!     public_key.as_bytes(),
//!     Duration::hours(1),
//! )
//! .unwrap();
//!
//! // Register: hash password
//! let stored = auth.hash_password("password123").unwrap();
//!
//! // Login: verify, then issue a token
//! let now = Utc::now();
//! assert!(auth.verify_password("password123", &stored));
//! let token = auth.issue_token("user-1", "alice", vec![], now).unwrap();
//!
//! // Validate token
//! let claims = auth.validate_token(&token, now).unwrap();
//! assert_eq!(claims.username, "alice");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::Authenticator;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use jwt::TokenError;
pub use jwt::TokenGate;
pub use jwt::TokenIssuer;
pub use password::password_fingerprint;
pub use password::username_fingerprint;
pub use password::verify_password_fingerprint;
pub use password::PasswordError;
pub use password::PasswordHasher;
