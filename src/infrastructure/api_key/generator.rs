//! API key generation
//!
//! Keys are a fixed namespace prefix followed by random lowercase
//! alphanumerics. Only a SHA-256 digest of the full key is stored.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Namespace prefix of every issued key
pub const DEFAULT_KEY_PREFIX: &str = "blog_";

const SECRET_LEN: usize = 32;
const DISPLAY_CHARS: usize = 4;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The full API key, only ever returned at creation
    pub key: String,
    /// Namespace prefix plus the first few random chars, safe to display
    pub display_prefix: String,
    /// Digest stored in place of the key
    pub hash: String,
}

/// Generator for API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new API key
    pub fn generate(&self) -> GeneratedApiKey {
        let mut rng = rand::thread_rng();
        let secret: String = (0..SECRET_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        self.from_secret(&secret)
    }

    /// Build a key from a known random part
    pub fn from_secret(&self, secret: &str) -> GeneratedApiKey {
        let key = format!("{}{}", self.prefix, secret);
        let visible: String = secret.chars().take(DISPLAY_CHARS).collect();

        GeneratedApiKey {
            hash: Self::hash_key(&key),
            display_prefix: format!("{}{}", self.prefix, visible),
            key,
        }
    }

    /// Digest of a presented key, used both for storage and lookup
    pub fn hash_key(key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        format!("sha256${}", URL_SAFE_NO_PAD.encode(digest))
    }

    /// Verify a presented key against a stored digest
    pub fn verify_key(key: &str, stored_hash: &str) -> bool {
        constant_time_compare(&Self::hash_key(key), stored_hash)
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Constant-time string comparison
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_format() {
        let generated = ApiKeyGenerator::default().generate();

        assert!(generated.key.starts_with("blog_"));
        assert_eq!(generated.key.len(), "blog_".len() + SECRET_LEN);

        let random = &generated.key["blog_".len()..];
        assert!(random
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

        assert_eq!(generated.display_prefix, &generated.key[..9]);
        assert!(generated.hash.starts_with("sha256$"));
        assert!(!generated.hash.contains(random));
    }

    #[test]
    fn test_keys_are_unique() {
        let generator = ApiKeyGenerator::default();
        let a = generator.generate();
        let b = generator.generate();

        assert_ne!(a.key, b.key);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_verify_key() {
        let generated = ApiKeyGenerator::new("test_").from_secret("abcdefgh");

        assert_eq!(generated.key, "test_abcdefgh");
        assert_eq!(generated.display_prefix, "test_abcd");
        assert!(ApiKeyGenerator::verify_key("test_abcdefgh", &generated.hash));
        assert!(!ApiKeyGenerator::verify_key("test_abcdefgX", &generated.hash));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("same", "same"));
        assert!(!constant_time_compare("same", "diff"));
        assert!(!constant_time_compare("short", "longer"));
    }
}
