//! On-disk fetch cache.
//!
//! Raw response bodies live in a blob directory named by fingerprint; a
//! SQLite table (async via tokio-rusqlite) records when each one expires.
//!
//! - SHA-256 fingerprints of `method + " " + url`
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Expiry evaluated at lookup time

pub mod blobs;
pub mod connection;
pub mod content;
pub mod hash;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use blobs::{BlobStore, FsBlobStore};
pub use connection::CacheDb;
pub use content::{ContentCache, Lookup};
pub use hash::Fingerprint;
pub use records::{CacheRecord, RecordStore};
