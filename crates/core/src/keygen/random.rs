//! Random storage-key generation.

use rand_core::{OsRng, TryRngCore};
use thiserror::Error;

use crate::file::FileId;

/// Random bytes drawn per key; hex encoding doubles this in characters.
const KEY_BYTES: usize = 16;

/// Key generation errors.
#[derive(Debug, Error)]
pub enum KeyGenError {
    /// The operating system entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),
}

/// Capability for minting fresh storage keys.
pub trait KeyGenerator: Send + Sync {
    /// Generate a fresh key.
    ///
    /// # Errors
    ///
    /// Returns an error when no key can be produced; there is no weaker
    /// fallback behind this.
    fn generate(&self) -> Result<FileId, KeyGenError>;
}

/// Production generator: 16 bytes from the OS entropy source, hex encoded.
///
/// Uniqueness of stored keys is additionally enforced by the record store's
/// primary key.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl RandomKeyGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> Result<FileId, KeyGenError> {
        let mut bytes = [0u8; KEY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| KeyGenError::Entropy(e.to_string()))?;
        Ok(FileId::from_entropy(&bytes))
    }
}
