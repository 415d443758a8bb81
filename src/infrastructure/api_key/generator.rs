//! Key credential generation
//!
//! Mints API key secrets of the form `<label>_<random>`, a short display
//! prefix for listings, and a SHA-256 digest for storage.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::domain::{DomainError, RandomSource};
use crate::infrastructure::random::OsRandomSource;

/// Random characters of the secret kept in the display prefix
const DISPLAY_CHARS: usize = 8;

/// Bytes of entropy in every secret
const SECRET_BYTES: usize = 32;

/// A freshly minted credential. `secret` is shown to the caller once.
#[derive(Clone)]
pub struct GeneratedCredential {
    pub secret: String,
    pub display_prefix: String,
    pub hash: String,
}

impl std::fmt::Debug for GeneratedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedCredential")
            .field("secret", &"[REDACTED]")
            .field("display_prefix", &self.display_prefix)
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

/// Stateless credential factory over an injected random source
#[derive(Debug, Clone)]
pub struct KeyCredentialFactory {
    random: Arc<dyn RandomSource>,
}

impl KeyCredentialFactory {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Generate a new credential labelled with `label`
    ///
    /// The label must be non-empty and free of `_`, which separates it from
    /// the random part.
    pub fn generate(&self, label: &str) -> Result<GeneratedCredential, DomainError> {
        Self::validate_label(label)?;

        let mut bytes = [0u8; SECRET_BYTES];
        self.random.fill(&mut bytes)?;

        let encoded = URL_SAFE_NO_PAD.encode(bytes);
        let secret = format!("{}_{}", label, encoded);
        let display_prefix = format!("{}_{}", label, &encoded[..DISPLAY_CHARS]);
        let hash = hash_secret(&secret);

        Ok(GeneratedCredential {
            secret,
            display_prefix,
            hash,
        })
    }

    pub fn validate_label(label: &str) -> Result<(), DomainError> {
        if label.is_empty() || label.contains('_') {
            return Err(DomainError::configuration(format!(
                "Invalid API key label '{}'",
                label
            )));
        }

        Ok(())
    }

    /// Check a presented secret against a stored hash
    pub fn verify(secret: &str, stored_hash: &str) -> bool {
        constant_time_compare(&hash_secret(secret), stored_hash)
    }

    /// Display prefix of a presented secret, or `None` if it is not shaped
    /// like one of ours
    pub fn display_prefix_of(secret: &str) -> Option<&str> {
        let separator = secret.find('_')?;
        let end = separator + 1 + DISPLAY_CHARS;

        if separator == 0 || secret.len() < end || !secret.is_char_boundary(end) {
            return None;
        }

        Some(&secret[..end])
    }
}

impl Default for KeyCredentialFactory {
    fn default() -> Self {
        Self::new(Arc::new(OsRandomSource))
    }
}

/// One-way digest of a full secret
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    format!("sha256${}", URL_SAFE_NO_PAD.encode(digest))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
