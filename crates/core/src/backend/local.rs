//! Local filesystem backend.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};

use super::error::BackendError;
use super::{ObjectStream, StorageBackend};

/// Filesystem-backed storage under a base directory.
///
/// Object keys map to direct children of the base directory; keys that could
/// name anything else are rejected before the filesystem is touched.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    base: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `base`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the base directory cannot be created.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let base = base.into();
        std::fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Base directory objects are stored under.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `key` to its on-disk path, rejecting unsafe keys.
    fn object_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        if !is_safe_key(key) {
            return Err(BackendError::invalid_key(key));
        }
        Ok(self.base.join(key))
    }

    /// Remove every object named `stem` or `stem` plus a dot-separated
    /// suffix.
    ///
    /// Objects are stored as `{key}.{ext}` where the key part never
    /// contains a dot, so matching on the stem reaches the object even when
    /// the caller no longer knows which suffix it was written under.
    ///
    /// # Errors
    ///
    /// Returns an error if the stem is empty, unsafe, or carries a suffix
    /// of its own, or if the directory scan or a removal fails. Matching
    /// nothing is not an error.
    pub async fn remove_stem(&self, stem: &str) -> Result<(), BackendError> {
        if !is_safe_key(stem) || stem.contains('.') {
            return Err(BackendError::invalid_key(stem));
        }

        let mut entries = fs::read_dir(&self.base).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let matched = name == stem
                || name
                    .strip_prefix(stem)
                    .is_some_and(|rest| rest.starts_with('.'));
            if matched {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }
}

/// A key is safe when it can only name a plain child of the base directory:
/// ASCII alphanumerics plus `.`, `-` and `_`, non-empty, and not dot-led.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

impl StorageBackend for LocalBackend {
    async fn put<R>(&self, key: &str, mut reader: R) -> Result<u64, BackendError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let path = self.object_path(key)?;

        // Removes the partial file if the copy fails or the future is dropped
        // mid-write; defused only after a clean flush.
        let cleanup = scopeguard::guard(path.clone(), |p| {
            let _ = std::fs::remove_file(p);
        });

        let mut file = File::create(&path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        let _ = scopeguard::ScopeGuard::into_inner(cleanup);
        Ok(written)
    }

    async fn get(&self, key: &str) -> Result<ObjectStream, BackendError> {
        let path = self.object_path(key)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::not_found(key));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        Ok(ObjectStream {
            reader: Box::pin(file),
            len,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, ReadBuf};

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = LocalBackend::new(dir.path()).expect("backend");
        (dir, backend)
    }

    fn dir_entries(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).expect("read_dir").count()
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let (_dir, backend) = backend();
        let payload = b"local object payload".to_vec();

        let written = backend
            .put("abc123.pdf", Cursor::new(payload.clone()))
            .await
            .expect("put succeeds");
        assert_eq!(written, payload.len() as u64);

        let mut stream = backend.get("abc123.pdf").await.expect("get succeeds");
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
    async fn test_get_missing_object_is_not_found() {
        let (_dir, backend) = backend();
        let err = backend.get("nope.pdf").await.unwrap_err();
        assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    }

    #[tokio::test]
    async fn test_unsafe_keys_are_rejected() {
        let (dir, backend) = backend();

        for key in ["", "..", "../escape", "a/b.pdf", "a\\b.pdf", ".hidden", "%2e%2e"] {
            let err = backend.put(key, Cursor::new(b"x".to_vec())).await.unwrap_err();
            assert!(
                matches!(err, BackendError::InvalidKey(_)),
                "key {key:?} should be rejected, got {err:?}"
            );
        }
        assert_eq!(dir_entries(&dir), 0);
    }

    /// Serves a few bytes, then fails.
    struct BrokenReader {
        head: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            if this.pos < this.head.len() {
                let n = buf.remaining().min(this.head.len() - this.pos);
                buf.put_slice(&this.head[this.pos..this.pos + n]);
                this.pos += n;
                Poll::Ready(Ok(()))
            } else {
                Poll::Ready(Err(io::Error::other("body stream broke")))
            }
        }
    }

    #[tokio::test]
    async fn test_failed_copy_removes_partial_file() {
        let (dir, backend) = backend();

        let reader = BrokenReader {
            head: vec![0x42; 1024],
            pos: 0,
        };
        let err = backend.put("partial.bin", reader).await.unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
        assert_eq!(dir_entries(&dir), 0, "partial file should be removed");
    }

    /// Serves a few bytes, then hangs forever.
    struct StallingReader {
        head: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for StallingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            if this.pos < this.head.len() {
                let n = buf.remaining().min(this.head.len() - this.pos);
                buf.put_slice(&this.head[this.pos..this.pos + n]);
                this.pos += n;
                Poll::Ready(Ok(()))
            } else {
                Poll::Pending
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_put_removes_partial_file() {
        let (dir, backend) = backend();

        let reader = StallingReader {
            head: vec![0x42; 1024],
            pos: 0,
        };
        let put = backend.put("inflight.bin", reader);
        let outcome = tokio::time::timeout(Duration::from_millis(50), put).await;
        assert!(outcome.is_err(), "put should still be inflight when dropped");
        assert_eq!(dir_entries(&dir), 0, "partial file should be removed");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (dir, backend) = backend();

        backend
            .put("gone.pdf", Cursor::new(b"bytes".to_vec()))
            .await
            .expect("put succeeds");
        backend.remove("gone.pdf").await.expect("remove succeeds");
        assert_eq!(dir_entries(&dir), 0);

        backend
            .remove("gone.pdf")
            .await
            .expect("removing an absent object succeeds");
    }

    #[tokio::test]
    async fn test_remove_stem_matches_any_suffix() {
        let (dir, backend) = backend();

        backend
            .put("abc123.pdf", Cursor::new(b"doc".to_vec()))
            .await
            .expect("put succeeds");
        backend
            .put("abc1234.pdf", Cursor::new(b"neighbor".to_vec()))
            .await
            .expect("put succeeds");

        backend
            .remove_stem("abc123")
            .await
            .expect("remove_stem succeeds");

        // Only the exact stem match goes; the longer neighbor stays.
        assert!(!dir.path().join("abc123.pdf").exists());
        assert!(dir.path().join("abc1234.pdf").is_file());

        backend
            .remove_stem("abc123")
            .await
            .expect("matching nothing succeeds");

        // Stems never carry a suffix.
        let err = backend.remove_stem("abc123.pdf").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidKey(_)));
    }
}
