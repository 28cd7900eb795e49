//! File storage orchestration.
//!
//! Uploads are validated by the classifier, keyed by the key generator,
//! routed to a backend by declared size, and recorded durably once their
//! bytes are stored. Downloads and deletions resolve public references
//! back through the file record and enforce ownership.

mod error;
mod service;
mod types;

pub use error::FileError;
pub use service::{DOWNLOAD_PATH_PREFIX, FileRecordRepository, FileService, SMALL_FILE_THRESHOLD};
pub use types::{
    BackendKind, FileDescriptor, FileDownload, FileId, FileRecord, MAX_ID_LEN, NewFileRecord,
    OwnerId, ParseFileIdError, UploadRequest,
};
