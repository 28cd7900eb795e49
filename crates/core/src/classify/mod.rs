//! Content classification for uploads.
//!
//! An upload is accepted only when three independent signals agree on a
//! single allowed format: the declared MIME type, the magic bytes at the
//! start of the content, and the filename extension. The allowed set is
//! fixed: PDF, JPEG, PNG.

mod classifier;
mod format;

pub use classifier::{ClassifyError, ContentClassifier, SNIFF_LEN};
pub use format::FileFormat;

pub(crate) use classifier::extension_of;
