//! File domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::ObjectReader;

/// Maximum length of a file identifier in characters.
pub const MAX_ID_LEN: usize = 128;

/// Error for malformed file identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid file identifier")]
pub struct ParseFileIdError;

/// Opaque identifier for a stored file.
///
/// Doubles as the canonical storage key: ASCII alphanumerics plus `-` and
/// `_`, between 1 and [`MAX_ID_LEN`] characters. Public references may carry
/// an extra display extension (`{id}.{ext}`); [`FileId::from_public`] splits
/// it off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileId(String);

impl FileId {
    /// Build an identifier from raw entropy bytes, hex encoded.
    pub(crate) fn from_entropy(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a public file reference into the canonical identifier and its
    /// optional display extension (lowercased, without the dot).
    ///
    /// `a1b2.pdf` parses to `a1b2` plus `Some("pdf")`; `a1b2` parses to
    /// `a1b2` plus `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when the identifier part is malformed.
    pub fn from_public(reference: &str) -> Result<(Self, Option<String>), ParseFileIdError> {
        match reference.rsplit_once('.') {
            Some((stem, ext))
                if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                Ok((stem.parse()?, Some(ext.to_ascii_lowercase())))
            }
            _ => Ok((reference.parse()?, None)),
        }
    }
}

impl FromStr for FileId {
    type Err = ParseFileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= MAX_ID_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseFileIdError)
        }
    }
}

impl TryFrom<String> for FileId {
    type Error = ParseFileIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a file's owner.
///
/// Minted and verified by the embedding application's authentication layer;
/// this crate only compares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Create a new random owner id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OwnerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for OwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which byte plane holds a stored file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local filesystem backend (small files).
    Local,
    /// Blob store backend (large files).
    Blob,
}

impl BackendKind {
    /// Convert to the database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Blob => "blob",
        }
    }

    /// Parse from the database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "blob" => Some(Self::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable pointer from a file identifier to its stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Canonical identifier, also the storage key.
    pub id: FileId,
    /// Owner the file belongs to.
    pub owner_id: OwnerId,
    /// Backend holding the content.
    pub backend: BackendKind,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Canonical identifier minted during upload.
    pub id: FileId,
    /// Owner the file belongs to.
    pub owner_id: OwnerId,
    /// Backend the content was written to.
    pub backend: BackendKind,
}

/// Client-declared metadata accompanying an upload stream.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename as declared by the client.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Declared size in bytes; drives backend routing only.
    pub size: u64,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Canonical file identifier.
    pub id: FileId,
    /// Public reference: the identifier plus its display extension.
    pub public_name: String,
    /// Caller-facing download path for the file.
    pub download_path: String,
    /// Backend the content was written to.
    pub backend: BackendKind,
}

/// A file opened for streaming download.
pub struct FileDownload {
    /// Streaming content reader; dropping it releases the backend handle.
    pub reader: ObjectReader,
    /// Content length in bytes.
    pub len: u64,
    /// Canonical MIME type hinted by the display extension, if recognized.
    pub content_type: Option<&'static str>,
}

impl fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDownload")
            .field("len", &self.len)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
