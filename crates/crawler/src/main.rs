//! dotgraph crawler entry point.
//!
//! Loads configuration, wires the cache, fetcher and graph store together and
//! runs one crawl to completion. Logging goes to stderr as JSON. Ctrl-C
//! cancels the crawl; in-flight fetches finish and the process exits after
//! the pipeline drains.

use anyhow::Result;
use dotgraph_client::{AdmissionController, AsyncFetcher, FetchClient, FetchConfig, RetryPolicy};
use dotgraph_core::cache::FsBlobStore;
use dotgraph_core::graph::{GraphStore, MemoryGraphStore, Neo4jGraphStore};
use dotgraph_core::{AppConfig, CacheDb, ContentCache, GraphUpsertService};
use dotgraph_crawler::{CrawlOrchestrator, CrawlSettings};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let settings = CrawlSettings::from_config(&config)?;

    let db = Arc::new(CacheDb::open(&config.db_path).await?);
    let blobs = Arc::new(FsBlobStore::new(&config.cache_dir).await?);
    let cache = ContentCache::new(db, blobs);
    let purged = cache.purge_expired().await?;
    tracing::info!(db_path = %config.db_path.display(), cache_dir = %config.cache_dir.display(), purged, "cache opened");

    let transport = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let fetcher = AsyncFetcher::new(
        cache,
        transport,
        AdmissionController::new(config.per_host_limit),
        RetryPolicy::from_config(&config),
    );

    let memory = config.dry_run.then(|| Arc::new(MemoryGraphStore::new()));
    let store: Arc<dyn GraphStore> = match &memory {
        Some(memory) => {
            tracing::info!("dry run: writing to in-memory graph");
            memory.clone()
        }
        None => Arc::new(
            Neo4jGraphStore::connect(
                &config.neo4j_uri,
                &config.neo4j_user,
                config.neo4j_password.as_deref().unwrap_or_default(),
            )
            .await?,
        ),
    };

    let orchestrator = CrawlOrchestrator::new(fetcher, GraphUpsertService::new(store), settings)?;

    let interrupt = orchestrator.fetcher().clone();
    let done = interrupt.cancellation_token();
    tokio::spawn(async move {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    tracing::warn!("interrupt received, draining in-flight fetches");
                    interrupt.cancel();
                }
            }
            _ = done.cancelled() => {}
        }
    });

    let stats = orchestrator.run().await?;

    if let Some(memory) = memory {
        tracing::info!(
            nodes = memory.node_count(),
            edges = memory.edge_count(),
            persons = memory.count_label("Person"),
            bills = memory.count_label("Bill"),
            "dry run graph"
        );
    }

    tracing::info!(
        pages = stats.pages,
        cache_hits = stats.cache_hits,
        network_fetches = stats.network_fetches,
        roll_calls = stats.roll_calls,
        skipped = stats.skipped,
        "done"
    );

    Ok(())
}
