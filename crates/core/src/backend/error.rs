//! Storage backend error types.

use thiserror::Error;

/// Storage backend operation errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No object stored under the key.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage key is malformed or would escape the backend root.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Underlying I/O failure.
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider-level operation failure.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl BackendError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// True when the error means no object exists under the key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for BackendError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}
