//! Core types and shared functionality for dotgraph.
//!
//! This crate provides:
//! - Fetch cache: SQLite expiry records plus on-disk response blobs
//! - Idempotent graph-upsert protocol with Neo4j and in-memory stores
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod graph;

pub use cache::{CacheDb, ContentCache, Fingerprint};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use graph::GraphUpsertService;
