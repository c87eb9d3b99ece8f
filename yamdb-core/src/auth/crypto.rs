use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hashing for authentication material.
///
/// Every signature is domain-separated with a salt, so one server key can
/// back several kinds of signed material.
#[derive(Debug)]
pub struct AuthCrypto {
    key: Zeroizing<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("token HMAC key must not be empty")]
    EmptyKey,
}

impl AuthCrypto {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, AuthCryptoError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptyKey);
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    /// HMAC-SHA-256 over `salt` followed by `message`, hex encoded.
    pub fn sign(&self, salt: &str, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(salt.as_bytes());
        mac.update(b"\x00");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time string comparison for secrets.
    pub fn secure_eq(a: &str, b: &str) -> bool {
        constant_time_eq::constant_time_eq(a.as_bytes(), b.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_are_hex_sha256() {
        let crypto = AuthCrypto::new("token-key").unwrap();
        let digest = crypto.sign("salt", "payload");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn salts_separate_signatures() {
        let crypto = AuthCrypto::new("token-key").unwrap();
        assert_ne!(crypto.sign("a", "payload"), crypto.sign("b", "payload"));
        assert_eq!(crypto.sign("a", "payload"), crypto.sign("a", "payload"));
    }

    #[test]
    fn keys_change_the_digest() {
        let left = AuthCrypto::new("one").unwrap();
        let right = AuthCrypto::new("two").unwrap();
        assert_ne!(left.sign("salt", "x"), right.sign("salt", "x"));
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(AuthCrypto::new(""), Err(AuthCryptoError::EmptyKey)));
    }

    #[test]
    fn secure_eq_compares_contents() {
        assert!(AuthCrypto::secure_eq("abc", "abc"));
        assert!(!AuthCrypto::secure_eq("abc", "abd"));
        assert!(!AuthCrypto::secure_eq("abc", "abcd"));
    }
}
