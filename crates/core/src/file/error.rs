//! File service errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::classify::ClassifyError;
use crate::file::types::FileId;
use crate::keygen::KeyGenError;

/// Errors from file upload, download, and delete operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The declared type, filename extension, and sniffed content disagree
    /// or fall outside the accepted formats.
    #[error("invalid content type: {0}")]
    InvalidContentType(#[from] ClassifyError),

    /// Minting a file identifier failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenError),

    /// Writing content to the storage backend failed.
    #[error("storage write failed: {0}")]
    StorageWrite(#[source] BackendError),

    /// Reading content from the storage backend failed.
    #[error("storage read failed: {0}")]
    StorageRead(#[source] BackendError),

    /// No file matches the given reference.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The caller does not own the file.
    #[error("access denied for file: {0}")]
    AccessDenied(FileId),

    /// A stored record names a backend this build does not recognize.
    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),

    /// Persisting the file record failed after the content was written.
    #[error("metadata write failed: {0}")]
    MetadataWrite(String),

    /// Loading a file record failed or produced an unreadable row.
    #[error("metadata read failed: {0}")]
    MetadataRead(String),
}

impl FileError {
    /// Create a not found error for the given reference.
    #[must_use]
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound(reference.into())
    }

    /// Create an unknown backend error.
    #[must_use]
    pub fn unknown_backend(value: impl Into<String>) -> Self {
        Self::UnknownBackend(value.into())
    }

    /// Create a metadata write error.
    #[must_use]
    pub fn metadata_write(message: impl Into<String>) -> Self {
        Self::MetadataWrite(message.into())
    }

    /// Create a metadata read error.
    #[must_use]
    pub fn metadata_read(message: impl Into<String>) -> Self {
        Self::MetadataRead(message.into())
    }
}
