//! Raw response bodies on disk, one file per fingerprint.

use super::hash::Fingerprint;
use crate::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Blob store contract used by [`ContentCache`](super::ContentCache).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Durably write `bytes` under `key`, replacing any previous blob.
    async fn write(&self, key: &Fingerprint, bytes: &[u8]) -> Result<(), Error>;
    /// Returns `Ok(None)` when no blob exists for `key`.
    async fn read(&self, key: &Fingerprint) -> Result<Option<Bytes>, Error>;
    /// Delete the blob for `key`. Deleting a missing blob is a no-op.
    async fn delete(&self, key: &Fingerprint) -> Result<(), Error>;
}

/// Filesystem blob store rooted at a cache directory.
///
/// Writes go to a uniquely named temp file in the same directory and are
/// renamed into place, so readers never observe a partially written blob.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl FsBlobStore {
    /// Create the store, creating `root` if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, tmp_seq: AtomicU64::new(0) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &Fingerprint) -> PathBuf {
        self.root.join(key.as_str())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn write(&self, key: &Fingerprint, bytes: &[u8]) -> Result<(), Error> {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = self.root.join(format!(".{}.{}.{}.tmp", key, std::process::id(), seq));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read(&self, key: &Fingerprint) -> Result<Option<Bytes>, Error> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &Fingerprint) -> Result<(), Error> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
