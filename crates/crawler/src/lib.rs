//! congress.gov ingestion pipeline for dotgraph.
//!
//! Members, bills and roll-call votes are fetched through the cache-first
//! [`dotgraph_client::AsyncFetcher`] and projected into the property graph as
//! `Person` and `Bill` nodes joined by `VOTED` edges.

pub mod context;
pub mod endpoints;
pub mod identity;
pub mod orchestrator;
pub mod project;
pub mod records;
pub mod shapes;
pub mod stats;

pub use orchestrator::{CrawlOrchestrator, CrawlSettings, Stage};
pub use stats::{CrawlStats, StatsSnapshot};
