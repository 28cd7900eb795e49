//! Storage key generation.
//!
//! Keys are minted through the [`KeyGenerator`] capability so the file
//! service never reaches for ambient randomness; tests inject deterministic
//! generators through the same seam.

mod random;

pub use random::{KeyGenError, KeyGenerator, RandomKeyGenerator};
