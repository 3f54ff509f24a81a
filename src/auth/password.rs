//! Password hashing
//!
//! Salted PBKDF2-HMAC-SHA512, 10 000 iterations, 64-byte output, hex encoded.

use sha2::Sha512;

const ITERATIONS: u32 = 10_000;
const KEY_LEN: usize = 64;

/// Stored form of the shared password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub hash: String,
    pub salt: String,
}

impl Credentials {
    /// Hash a plaintext password with `salt`
    pub fn new(password: &str, salt: impl Into<String>) -> Self {
        let salt = salt.into();
        Self {
            hash: hash_password(password, &salt),
            salt,
        }
    }

    /// Hash a plaintext password with a random 16-byte hex salt
    pub fn with_random_salt(password: &str) -> Self {
        Self::new(password, hex::encode(rand::random::<[u8; 16]>()))
    }

    pub fn verify(&self, candidate: &str) -> bool {
        hash_password(candidate, &self.salt) == self.hash
    }
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), ITERATIONS, &mut key);
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let hash = hash_password("secret", "salt");
        assert_eq!(hash.len(), KEY_LEN * 2);
        assert_eq!(hash, hash_password("secret", "salt"));
        assert_ne!(hash, hash_password("secret", "pepper"));
        assert_ne!(hash, hash_password("Secret", "salt"));
    }

    #[test]
    fn test_verify() {
        let credentials = Credentials::new("hunter2", "abc");
        assert!(credentials.verify("hunter2"));
        assert!(!credentials.verify("hunter3"));
        assert!(!credentials.verify(""));
    }

    #[test]
    fn test_random_salt() {
        let a = Credentials::with_random_salt("pw");
        let b = Credentials::with_random_salt("pw");
        assert_eq!(a.salt.len(), 32);
        assert_ne!(a.salt, b.salt);
        assert!(a.verify("pw") && b.verify("pw"));
    }
}
