//! Allowed file formats and their signal tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// File formats accepted by the upload pipeline.
///
/// The set is closed: every signal an upload carries must resolve to one of
/// these before the upload is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// PDF document.
    Pdf,
    /// JPEG image.
    Jpeg,
    /// PNG image.
    Png,
}

impl FileFormat {
    /// All accepted formats.
    pub const ALL: [Self; 3] = [Self::Pdf, Self::Jpeg, Self::Png];

    /// Resolve a declared MIME type to a format.
    ///
    /// Matching is case-insensitive; `image/jpg` is tolerated as a common
    /// nonstandard alias of `image/jpeg`.
    #[must_use]
    pub fn from_media_type(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Resolve a filename extension (without the dot) to a format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Sniff a format from the leading bytes of the content.
    ///
    /// Detection is magic-number based and never consults declared metadata.
    #[must_use]
    pub fn sniff(head: &[u8]) -> Option<Self> {
        let kind = infer::get(head)?;
        Self::from_media_type(kind.mime_type())
    }

    /// Canonical MIME type for this format.
    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Canonical file extension (without the dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}
