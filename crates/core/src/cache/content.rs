//! ContentCache: fingerprint -> (expiry record, raw bytes).
//!
//! The record store and blob store are kept in lockstep:
//!
//! - `store` writes the blob first and registers the record second, so an
//!   interrupted process can leave an orphan blob but never a record that
//!   points at nothing.
//! - `evict` deletes the record first and the blob second, for the same reason.
//! - A record whose blob cannot be read is reported to the caller as a miss.

use super::blobs::BlobStore;
use super::hash::Fingerprint;
use super::records::{CacheRecord, RecordStore};
use crate::Error;
use crate::clock::{Clock, SystemClock};
use bytes::Bytes;
use chrono::Duration;
use std::sync::Arc;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// No record for this fingerprint.
    Absent,
    /// A record that has not expired yet.
    Fresh(CacheRecord),
    /// A record whose expiry is at or before "now".
    Expired(CacheRecord),
}

/// Fetch cache backed by a metadata record store and a blob store.
#[derive(Clone)]
pub struct ContentCache {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache").finish_non_exhaustive()
    }
}

impl ContentCache {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_clock(records, blobs, Arc::new(SystemClock))
    }

    pub fn with_clock(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self { records, blobs, clock }
    }

    /// Look up a fingerprint and classify it against the current time.
    ///
    /// "Not found" is `Lookup::Absent`; only storage failures are errors.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Lookup, Error> {
        Ok(match self.records.find(fingerprint).await? {
            None => Lookup::Absent,
            Some(record) if record.is_fresh(self.clock.now()) => Lookup::Fresh(record),
            Some(record) => Lookup::Expired(record),
        })
    }

    /// Read the cached bytes for a fresh record.
    ///
    /// Returns `None` if the blob is missing or unreadable; the caller should
    /// treat that as a miss and refetch.
    pub async fn read_blob(&self, fingerprint: &Fingerprint) -> Option<Bytes> {
        match self.blobs.read(fingerprint).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                tracing::warn!(%fingerprint, "cache record present but blob missing");
                None
            }
            Err(e) => {
                tracing::warn!(%fingerprint, error = %e, "cache blob unreadable");
                None
            }
        }
    }

    /// Persist `bytes` and register a record expiring `ttl` from now.
    ///
    /// A `ttl` that would push the expiry past the representable range is
    /// rejected before anything is written.
    pub async fn store(
        &self, fingerprint: &Fingerprint, method: &str, url: &str, bytes: &[u8], ttl: Duration,
    ) -> Result<CacheRecord, Error> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| Error::InvalidInput(format!("cache ttl out of range: {ttl}")))?;

        self.blobs.write(fingerprint, bytes).await?;

        let record = CacheRecord {
            fingerprint: fingerprint.clone(),
            method: method.to_string(),
            url: url.to_string(),
            fetched_at: now,
            expires_at,
        };
        self.records.insert(&record).await?;

        tracing::debug!(%fingerprint, bytes = bytes.len(), expires_at = %record.expires_at, "cache entry stored");
        Ok(record)
    }

    /// Remove the record and its blob.
    pub async fn evict(&self, fingerprint: &Fingerprint) -> Result<(), Error> {
        self.records.delete(fingerprint).await?;
        self.blobs.delete(fingerprint).await?;
        tracing::debug!(%fingerprint, "cache entry evicted");
        Ok(())
    }

    /// Every record, for maintenance and diagnostics.
    pub async fn list_all(&self) -> Result<Vec<CacheRecord>, Error> {
        self.records.list_all().await
    }

    /// Evict every expired entry. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = self.clock.now();
        let mut removed = 0u64;
        for record in self.records.list_all().await? {
            if !record.is_fresh(now) {
                self.evict(&record.fingerprint).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
