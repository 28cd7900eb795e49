//! File service implementation.

use std::io::Cursor;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, warn};

use super::error::FileError;
use super::types::{
    BackendKind, FileDescriptor, FileDownload, FileId, FileRecord, NewFileRecord, OwnerId,
    UploadRequest,
};
use crate::backend::{BackendError, BlobBackend, LocalBackend, StorageBackend, StorageConfig};
use crate::classify::{ContentClassifier, FileFormat, SNIFF_LEN};
use crate::keygen::KeyGenerator;

/// Uploads declaring fewer bytes than this go to the local backend; the rest
/// go to the blob store.
pub const SMALL_FILE_THRESHOLD: u64 = 1 << 20;

/// Path prefix for download references handed back to callers.
pub const DOWNLOAD_PATH_PREFIX: &str = "/files";

/// Repository trait for file record persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait FileRecordRepository: Send + Sync {
    /// Persist a new file record.
    fn create(
        &self,
        input: NewFileRecord,
    ) -> impl std::future::Future<Output = Result<FileRecord, FileError>> + Send;

    /// Find a file record by its identifier.
    fn find_by_id(
        &self,
        id: &FileId,
    ) -> impl std::future::Future<Output = Result<Option<FileRecord>, FileError>> + Send;

    /// Delete a file record. Returns `true` when a record was removed.
    fn delete(
        &self,
        id: &FileId,
    ) -> impl std::future::Future<Output = Result<bool, FileError>> + Send;
}

/// File service coordinating content validation, key generation, backend
/// routing, and record persistence.
pub struct FileService<R: FileRecordRepository, G: KeyGenerator> {
    local: LocalBackend,
    blob: BlobBackend,
    records: Arc<R>,
    keys: G,
    classifier: ContentClassifier,
}

impl<R: FileRecordRepository, G: KeyGenerator> FileService<R, G> {
    /// Create a new file service over already-initialized backends.
    #[must_use]
    pub fn new(local: LocalBackend, blob: BlobBackend, records: Arc<R>, keys: G) -> Self {
        Self {
            local,
            blob,
            records,
            keys,
            classifier: ContentClassifier::new(),
        }
    }

    /// Create a file service from storage configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend cannot be initialized.
    pub fn from_config(
        config: &StorageConfig,
        records: Arc<R>,
        keys: G,
    ) -> Result<Self, BackendError> {
        let local = LocalBackend::new(&config.local_root)?;
        let blob = BlobBackend::from_provider(&config.blob)?;
        Ok(Self::new(local, blob, records, keys))
    }

    /// Accept an upload stream and store it durably.
    ///
    /// The leading bytes are buffered for content sniffing, then replayed
    /// ahead of the remaining stream so the backend sees the full content.
    /// The declared size routes the upload: below
    /// [`SMALL_FILE_THRESHOLD`] bytes it goes to the local backend,
    /// otherwise to the blob store. The file record is written only after
    /// the content write succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Declared type, filename extension, and sniffed content disagree
    /// - Key generation fails
    /// - The backend write fails
    /// - The file record cannot be persisted (content is already stored
    ///   and is flagged as orphaned)
    pub async fn upload<S>(
        &self,
        request: &UploadRequest,
        mut body: S,
        owner: OwnerId,
    ) -> Result<FileDescriptor, FileError>
    where
        S: AsyncRead + Send + Unpin,
    {
        // Buffer the sniff window before anything touches a backend.
        let mut head = vec![0u8; SNIFF_LEN];
        let filled = fill_prefix(&mut body, &mut head)
            .await
            .map_err(|e| FileError::StorageWrite(e.into()))?;
        head.truncate(filled);

        let format = self
            .classifier
            .classify(&request.content_type, &head, &request.filename)?;

        let id = self.keys.generate()?;

        let ext = crate::classify::extension_of(&request.filename)
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| format.extension().to_string());
        let public_name = format!("{id}.{ext}");

        let backend = if request.size < SMALL_FILE_THRESHOLD {
            BackendKind::Local
        } else {
            BackendKind::Blob
        };

        // Replay the sniffed prefix ahead of the rest of the stream.
        let content = Cursor::new(head).chain(body);
        let written = match backend {
            BackendKind::Local => self.local.put(&public_name, content).await,
            BackendKind::Blob => self.blob.put(id.as_str(), content).await,
        }
        .map_err(FileError::StorageWrite)?;

        debug!(
            key = %id,
            backend = %backend,
            declared_size = request.size,
            written,
            "file content stored"
        );

        let record = self
            .records
            .create(NewFileRecord {
                id: id.clone(),
                owner_id: owner,
                backend,
            })
            .await
            .map_err(|e| {
                // The stored object now has no record pointing at it; flag
                // it for the out-of-band orphan sweep.
                error!(
                    error = %e,
                    key = %id,
                    backend = %backend,
                    "file record creation failed after content write, object orphaned"
                );
                e
            })?;

        let download_path = format!("{DOWNLOAD_PATH_PREFIX}/{public_name}");

        Ok(FileDescriptor {
            id: record.id,
            public_name,
            download_path,
            backend: record.backend,
        })
    }

    /// Open a file for streaming download.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reference is malformed or matches no record
    /// - The caller does not own the file
    /// - The backend read fails
    pub async fn download(&self, reference: &str, caller: OwnerId) -> Result<FileDownload, FileError> {
        let (record, ext) = self.authorize(reference, caller).await?;

        let stream = match record.backend {
            BackendKind::Local => {
                let key = local_key(&record.id, ext.as_deref());
                self.local.get(&key).await
            }
            BackendKind::Blob => self.blob.get(record.id.as_str()).await,
        }
        .map_err(|e| {
            if e.is_not_found() {
                error!(
                    key = %record.id,
                    backend = %record.backend,
                    "file record exists but backend holds no content"
                );
                FileError::not_found(reference)
            } else {
                FileError::StorageRead(e)
            }
        })?;

        let content_type = ext
            .as_deref()
            .and_then(FileFormat::from_extension)
            .map(FileFormat::media_type);

        Ok(FileDownload {
            reader: stream.reader,
            len: stream.len,
            content_type,
        })
    }

    /// Delete a file and its record.
    ///
    /// The record goes first: once it is gone the file stops being served,
    /// even if content removal fails afterwards. Content removal matches on
    /// the canonical identifier, not the reference's display suffix, so a
    /// stripped or re-suffixed reference still reclaims the bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reference is malformed or matches no record
    /// - The caller does not own the file
    /// - The record deletion fails
    pub async fn delete(&self, reference: &str, caller: OwnerId) -> Result<(), FileError> {
        let (record, _) = self.authorize(reference, caller).await?;

        let removed = self.records.delete(&record.id).await?;
        if !removed {
            return Err(FileError::not_found(reference));
        }

        let result = match record.backend {
            BackendKind::Local => self.local.remove_stem(record.id.as_str()).await,
            BackendKind::Blob => self.blob.remove(record.id.as_str()).await,
        };

        if let Err(e) = result {
            warn!(
                error = %e,
                key = %record.id,
                backend = %record.backend,
                "file content removal failed after record deletion, object orphaned"
            );
        }

        debug!(key = %record.id, backend = %record.backend, "file deleted");

        Ok(())
    }

    /// Resolve a public reference to its record and verify ownership.
    ///
    /// Malformed and unknown references both come back as not found so the
    /// caller cannot tell which identifiers exist.
    async fn authorize(
        &self,
        reference: &str,
        caller: OwnerId,
    ) -> Result<(FileRecord, Option<String>), FileError> {
        let Ok((id, ext)) = FileId::from_public(reference) else {
            debug!(reference = %reference, "malformed file reference");
            return Err(FileError::not_found(reference));
        };

        let record = self
            .records
            .find_by_id(&id)
            .await?
            .ok_or_else(|| FileError::not_found(reference))?;

        if record.owner_id != caller {
            warn!(key = %record.id, "file access denied for non-owner");
            return Err(FileError::AccessDenied(record.id));
        }

        Ok((record, ext))
    }
}

/// Storage key for the local backend.
///
/// Local objects keep the display extension so the directory stays
/// recognizable; blob objects use the bare identifier.
fn local_key(id: &FileId, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Read from `reader` until `buf` is full or the stream ends. Returns the
/// number of bytes read.
async fn fill_prefix<S>(reader: &mut S, buf: &mut [u8]) -> std::io::Result<usize>
where
    S: AsyncRead + Send + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
