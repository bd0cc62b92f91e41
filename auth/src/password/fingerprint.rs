use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Deterministic fingerprint of a username, used to key cache entries.
///
/// Lowercase hex SHA-256 of the UTF-8 username (64 characters).
pub fn username_fingerprint(username: &str) -> String {
    hex::encode(Sha256::digest(username.as_bytes()))
}

/// Fingerprint of a verified password, bound to its username.
///
/// Cheap to compute, so cached login material can be checked without
/// repeating the key stretch. Never a substitute for the stored digest.
pub fn password_fingerprint(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a password against a fingerprint in constant time.
pub fn verify_password_fingerprint(fingerprint: &str, username: &str, password: &str) -> bool {
    let computed = password_fingerprint(username, password);
    bool::from(computed.as_bytes().ct_eq(fingerprint.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_fingerprint_is_stable() {
        assert_eq!(username_fingerprint("alice"), username_fingerprint("alice"));
        assert_ne!(username_fingerprint("alice"), username_fingerprint("Alice"));
        assert_eq!(
            username_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_username_fingerprint_has_fixed_length() {
        assert_eq!(username_fingerprint("a").len(), 64);
        assert_eq!(username_fingerprint(&"a".repeat(4096)).len(), 64);
    }

    #[test]
    fn test_password_fingerprint_is_bound_to_username() {
        let alice = password_fingerprint("alice", "secret");
        let bob = password_fingerprint("bob", "secret");
        assert_ne!(alice, bob);
        assert_eq!(alice, password_fingerprint("alice", "secret"));
        assert_ne!(alice, password_fingerprint("alice", "Secret"));
    }

    #[test]
    fn test_verify_password_fingerprint() {
        let fingerprint = password_fingerprint("alice", "secret");

        assert!(verify_password_fingerprint(&fingerprint, "alice", "secret"));
        assert!(!verify_password_fingerprint(&fingerprint, "alice", "wrong"));
        assert!(!verify_password_fingerprint(&fingerprint, "bob", "secret"));
        assert!(!verify_password_fingerprint("", "alice", "secret"));
        assert!(!verify_password_fingerprint(&fingerprint[..63], "alice", "secret"));
    }

    #[test]
    fn test_password_fingerprint_separates_fields() {
        assert_ne!(
            password_fingerprint("ab", "c"),
            password_fingerprint("a", "bc")
        );
    }
}
