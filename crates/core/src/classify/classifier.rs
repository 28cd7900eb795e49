//! Three-signal content classifier.

use std::path::Path;

use thiserror::Error;

use super::format::FileFormat;

/// Number of leading content bytes the classifier inspects.
pub const SNIFF_LEN: usize = 512;

/// Reasons an upload fails classification.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Declared MIME type is outside the accepted set.
    #[error("declared content type '{0}' is not allowed")]
    DeclaredType(String),

    /// Filename carries no extension.
    #[error("filename '{0}' has no extension")]
    MissingExtension(String),

    /// Filename extension is outside the accepted set.
    #[error("file extension '{0}' is not allowed")]
    Extension(String),

    /// Leading content bytes match no accepted format.
    #[error("file content does not match any allowed format")]
    UnrecognizedContent,

    /// Each signal is individually acceptable but they name different formats.
    #[error("declared type '{declared}', extension '{extension}' and content '{sniffed}' disagree")]
    SignalMismatch {
        /// Format named by the declared MIME type.
        declared: FileFormat,
        /// Format named by the filename extension.
        extension: FileFormat,
        /// Format detected from the content.
        sniffed: FileFormat,
    },
}

/// Classifies uploads by requiring the declared MIME type, the sniffed
/// content, and the filename extension to agree on one allowed format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    /// Create a classifier over the built-in format table.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Classify an upload from its three signals.
    ///
    /// `head` is the leading bytes of the content; at most [`SNIFF_LEN`] of
    /// them are inspected. `filename` supplies the extension signal only and
    /// is never touched as a path.
    ///
    /// # Errors
    ///
    /// Returns the first failing signal, or
    /// [`ClassifyError::SignalMismatch`] when all three signals are
    /// individually acceptable but disagree.
    pub fn classify(
        &self,
        declared_type: &str,
        head: &[u8],
        filename: &str,
    ) -> Result<FileFormat, ClassifyError> {
        let declared = FileFormat::from_media_type(declared_type)
            .ok_or_else(|| ClassifyError::DeclaredType(declared_type.to_string()))?;

        let ext = extension_of(filename)
            .ok_or_else(|| ClassifyError::MissingExtension(filename.to_string()))?;
        let extension =
            FileFormat::from_extension(ext).ok_or_else(|| ClassifyError::Extension(ext.to_string()))?;

        let head = &head[..head.len().min(SNIFF_LEN)];
        let sniffed = FileFormat::sniff(head).ok_or(ClassifyError::UnrecognizedContent)?;

        if declared == extension && extension == sniffed {
            Ok(declared)
        } else {
            Err(ClassifyError::SignalMismatch {
                declared,
                extension,
                sniffed,
            })
        }
    }
}

/// Extension of `filename` (final `.suffix`, without the dot), if any.
pub(crate) fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}
