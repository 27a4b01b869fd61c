use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// One-way password digest used for storage and comparison.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> String;

    /// Compare `plaintext` against a stored digest
    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        self.hash(plaintext) == digest
    }
}

/// Unsalted SHA-256, URL-safe base64 with padding.
///
/// Matches the digests already stored in the `users` table. Identical passwords share a
/// digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plaintext.as_bytes());
        URL_SAFE.encode(hasher.finalize())
    }
}
