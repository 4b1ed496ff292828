//! One-time token generation and hashing
//!
//! Refresh, verification and invitation tokens are bearer secrets: the raw
//! value goes to the user once, only the HMAC-SHA256 digest is persisted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-based token hasher keyed on a server secret.
#[derive(Clone)]
pub struct TokenHasher {
    key: Vec<u8>,
}

impl TokenHasher {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
        }
    }

    /// Hex digest of HMAC-SHA256 over the token.
    pub fn hash(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Generate a random 256-bit token and its digest.
    pub fn generate(&self) -> (String, String) {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);
        let hash = self.hash(&token);
        (token, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_keyed() {
        let hasher = TokenHasher::new("secret-a");
        assert_eq!(hasher.hash("token"), hasher.hash("token"));
        assert_ne!(hasher.hash("token"), hasher.hash("other"));

        let other = TokenHasher::new("secret-b");
        assert_ne!(hasher.hash("token"), other.hash("token"));
    }

    #[test]
    fn generated_tokens_are_unique_and_verifiable() {
        let hasher = TokenHasher::new("secret");
        let (token_a, hash_a) = hasher.generate();
        let (token_b, hash_b) = hasher.generate();
        assert_ne!(token_a, token_b);
        assert_eq!(hasher.hash(&token_a), hash_a);
        assert_eq!(hasher.hash(&token_b), hash_b);
        // 256 bits of entropy, base64url without padding
        assert_eq!(token_a.len(), 43);
    }
}
