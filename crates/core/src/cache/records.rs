//! Cache record CRUD against the metadata database.

use super::connection::CacheDb;
use super::hash::Fingerprint;
use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Bookkeeping row for one cached fetch.
///
/// Records are never updated in place: a refetch after expiry deletes the old
/// row and inserts a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub fingerprint: Fingerprint,
    pub method: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheRecord {
    /// Whether the record is still usable at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Metadata store contract used by [`ContentCache`](super::ContentCache).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns `Ok(None)` when no record exists; errors are storage failures only.
    async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheRecord>, Error>;
    /// Insert or replace the record for its fingerprint.
    async fn insert(&self, record: &CacheRecord) -> Result<(), Error>;
    async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<CacheRecord>, Error>;
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_record((key, method, url, fetched_at, expires_at): (String, String, String, String, i64)) -> Result<CacheRecord, Error> {
    let fingerprint = Fingerprint::parse(&key)?;
    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
        .map_err(|e| Error::InvalidInput(format!("bad fetched_at for {key}: {e}")))?
        .with_timezone(&Utc);
    let expires_at = Utc
        .timestamp_opt(expires_at, 0)
        .single()
        .ok_or_else(|| Error::InvalidInput(format!("bad expires_at for {key}: {expires_at}")))?;
    Ok(CacheRecord { fingerprint, method, url, fetched_at, expires_at })
}

impl CacheDb {
    /// Get a cache record by fingerprint.
    pub async fn find_record(&self, fingerprint: &Fingerprint) -> Result<Option<CacheRecord>, Error> {
        let key = fingerprint.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<_>, Error> {
                let mut stmt =
                    conn.prepare("SELECT key, method, url, fetched_at, expires_at FROM cached_items WHERE key = ?1")?;

                match stmt.query_row(params![key], row_to_record) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_record).transpose()
    }

    /// Insert a cache record, replacing any existing row for the same key.
    ///
    /// Two tasks that miss on the same URL concurrently both land here; the
    /// last writer wins.
    pub async fn insert_record(&self, record: &CacheRecord) -> Result<(), Error> {
        let key = record.fingerprint.to_string();
        let method = record.method.clone();
        let url = record.url.clone();
        let fetched_at = record.fetched_at.to_rfc3339();
        let expires_at = record.expires_at.timestamp();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cached_items (key, method, url, fetched_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        fetched_at = excluded.fetched_at,
                        expires_at = excluded.expires_at",
                    params![key, method, url, fetched_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache record by fingerprint. Deleting a missing key is a no-op.
    pub async fn delete_record(&self, fingerprint: &Fingerprint) -> Result<(), Error> {
        let key = fingerprint.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("DELETE FROM cached_items WHERE key = ?1", params![key])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// List every cache record, oldest expiry first.
    pub async fn list_records(&self) -> Result<Vec<CacheRecord>, Error> {
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<_>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, fetched_at, expires_at FROM cached_items ORDER BY expires_at ASC",
                )?;
                let rows = stmt
                    .query_map([], row_to_record)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(into_record).collect()
    }
}

#[async_trait]
impl RecordStore for CacheDb {
    async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheRecord>, Error> {
        self.find_record(fingerprint).await
    }

    async fn insert(&self, record: &CacheRecord) -> Result<(), Error> {
        self.insert_record(record).await
    }

    async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), Error> {
        self.delete_record(fingerprint).await
    }

    async fn list_all(&self) -> Result<Vec<CacheRecord>, Error> {
        self.list_records().await
    }
}
