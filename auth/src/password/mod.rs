pub mod argon2;
pub mod errors;
pub mod fingerprint;

pub use argon2::PasswordHasher;
pub use argon2::STORED_DIGEST_LEN;
pub use errors::PasswordError;
pub use fingerprint::password_fingerprint;
pub use fingerprint::username_fingerprint;
pub use fingerprint::verify_password_fingerprint;
