//! Fetch side of dotgraph.
//!
//! This crate provides the HTTP transport, per-host admission control,
//! retry policy, and the cache-first [`AsyncFetcher`] the crawl pipeline
//! chains its stages through.

pub mod admission;
pub mod fetch;
pub mod fetcher;
pub mod retry;

pub use admission::{AdmissionController, AdmissionToken};
pub use fetch::{FetchClient, FetchConfig, FetchRequest, Method, Transport};
pub use fetcher::{AsyncFetcher, CacheOptions, Completion, FetchSource, Fetched};
pub use retry::RetryPolicy;
