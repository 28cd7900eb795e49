//! Storage backends for file content.
//!
//! Two byte planes sit behind one seam:
//!
//! - [`LocalBackend`] - files on the local filesystem under a base directory
//! - [`BlobBackend`] - objects in a blob store via Apache OpenDAL
//!   (S3-compatible, Azure Blob, or in-memory for development)
//!
//! Backends move opaque byte streams keyed by opaque strings. Naming,
//! routing, ownership, and metadata all live a layer up in
//! [`file`](crate::file).

mod blob;
mod config;
mod error;
mod local;

pub use blob::BlobBackend;
pub use config::{BlobProvider, StorageConfig};
pub use error::BackendError;
pub use local::LocalBackend;

use std::fmt;
use std::pin::Pin;

use tokio::io::AsyncRead;

/// Boxed streaming reader over stored object bytes.
///
/// Dropping the reader releases the underlying handle.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// A stored object opened for streaming download.
pub struct ObjectStream {
    /// Streaming content reader.
    pub reader: ObjectReader,
    /// Object length in bytes.
    pub len: u64,
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Streaming byte-plane operations shared by all backends.
///
/// `put` drains the reader in bounded chunks and never buffers a whole
/// object; a failed or dropped `put` leaves no partial object behind.
pub trait StorageBackend: Send + Sync {
    /// Store the reader's bytes under `key`, returning the byte count.
    fn put<R>(
        &self,
        key: &str,
        reader: R,
    ) -> impl std::future::Future<Output = Result<u64, BackendError>> + Send
    where
        R: AsyncRead + Send + Unpin;

    /// Open the object under `key` for streaming download.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<ObjectStream, BackendError>> + Send;

    /// Remove the object under `key`; removing an absent object succeeds.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;
}
