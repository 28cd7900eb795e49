//! Blob store backend over Apache OpenDAL.

use bytes::BytesMut;
use opendal::{Operator, services};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use super::config::BlobProvider;
use super::error::BackendError;
use super::{ObjectStream, StorageBackend};

/// Chunk size for streaming writes.
const WRITE_CHUNK: usize = 256 * 1024;

/// Blob-store-backed storage behind an OpenDAL [`Operator`].
#[derive(Debug, Clone)]
pub struct BlobBackend {
    operator: Operator,
}

impl BlobBackend {
    /// Create a backend from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be initialized.
    pub fn from_provider(provider: &BlobProvider) -> Result<Self, BackendError> {
        let operator = Self::create_operator(provider)?;
        Ok(Self { operator })
    }

    /// In-memory backend for development and tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be initialized.
    pub fn in_memory() -> Result<Self, BackendError> {
        Self::from_provider(&BlobProvider::memory())
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &BlobProvider) -> Result<Operator, BackendError> {
        match provider {
            BlobProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| BackendError::configuration(e.to_string()))?
                    .finish())
            }
            BlobProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Ok(Operator::new(builder)
                    .map_err(|e| BackendError::configuration(e.to_string()))?
                    .finish())
            }
            BlobProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| BackendError::configuration(e.to_string()))?
                .finish()),
        }
    }
}

impl StorageBackend for BlobBackend {
    async fn put<R>(&self, key: &str, mut reader: R) -> Result<u64, BackendError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut writer = self.operator.writer(key).await?;
        let mut buf = BytesMut::new();
        let mut written = 0u64;

        loop {
            buf.reserve(WRITE_CHUNK);
            let n = match reader.read_buf(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }
            written += n as u64;

            if let Err(e) = writer.write(buf.split().freeze()).await {
                let _ = writer.abort().await;
                return Err(e.into());
            }
        }

        if let Err(e) = writer.close().await {
            let _ = writer.abort().await;
            return Err(e.into());
        }
        Ok(written)
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, BackendError> {
        let meta = self.operator.stat(key).await?;
        let len = meta.content_length();
        if len == 0 {
            return Ok(ObjectStream {
                reader: Box::pin(tokio::io::empty()),
                len,
            });
        }

        let reader = self.operator.reader(key).await?;
        let stream = reader.into_bytes_stream(0..len).await?;

        Ok(ObjectStream {
            reader: Box::pin(StreamReader::new(stream)),
            len,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.operator.delete(key).await.map_err(BackendError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let backend = BlobBackend::in_memory().expect("backend");
        let payload = b"blob object payload".to_vec();

        let written = backend
            .put("abc123", Cursor::new(payload.clone()))
            .await
            .expect("put succeeds");
        assert_eq!(written, payload.len() as u64);

        let mut stream = backend.get("abc123").await.expect("get succeeds");
        assert_eq!(stream.len, payload.len() as u64);

        let mut bytes = Vec::new();
        stream
            .reader
            .read_to_end(&mut bytes)
            .await
            .expect("read all");
        assert_eq!(bytes, payload);
    }

    #[tokio::test]
    async fn test_multi_chunk_payload_round_trips() {
        let backend = BlobBackend::in_memory().expect("backend");
        let payload: Vec<u8> = (0..WRITE_CHUNK * 2 + 512)
            .map(|i| (i % 251) as u8)
            .collect();

        let written = backend
            .put("big", Cursor::new(payload.clone()))
            .await
            .expect("put succeeds");
        assert_eq!(written, payload.len() as u64);

        let mut stream = backend.get("big").await.expect("get succeeds");
        let mut bytes = Vec::new();
        stream
            .reader
            .read_to_end(&mut bytes)
            .await
            .expect("read all");
        assert_eq!(bytes, payload);
    }

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let backend = BlobBackend::in_memory().expect("backend");
        let err = backend.get("nope").await.unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let backend = BlobBackend::in_memory().expect("backend");

        backend
            .put("gone", Cursor::new(b"bytes".to_vec()))
            .await
            .expect("put succeeds");
        backend.remove("gone").await.expect("remove succeeds");
        assert!(backend.get("gone").await.unwrap_err().is_not_found());

        backend
            .remove("gone")
            .await
            .expect("removing an absent object succeeds");
    }

    #[tokio::test]
    async fn test_empty_payload_round_trips() {
        let backend = BlobBackend::in_memory().expect("backend");

        let written = backend
            .put("empty", Cursor::new(Vec::new()))
            .await
            .expect("put succeeds");
        assert_eq!(written, 0);

        let stream = backend.get("empty").await.expect("get succeeds");
        assert_eq!(stream.len, 0);
    }
}
