//! Crawl counters.

use dotgraph_client::FetchSource;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CrawlStats {
    pages: AtomicU64,
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
    members: AtomicU64,
    bills: AtomicU64,
    roll_calls: AtomicU64,
    votes: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`CrawlStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Payloads delivered to a stage handler.
    pub pages: u64,
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub members: u64,
    pub bills: u64,
    pub roll_calls: u64,
    /// VOTED edges written.
    pub votes: u64,
    /// Branches or entities dropped because of an error.
    pub failures: u64,
    /// Fetches not issued because the crawl was cancelled.
    pub skipped: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CrawlStats {
    pub(crate) fn fetched(&self, source: FetchSource) {
        bump(&self.pages);
        match source {
            FetchSource::Cache => bump(&self.cache_hits),
            FetchSource::Network => bump(&self.network_fetches),
        }
    }

    pub(crate) fn member(&self) {
        bump(&self.members);
    }

    pub(crate) fn bill(&self) {
        bump(&self.bills);
    }

    pub(crate) fn roll_call(&self) {
        bump(&self.roll_calls);
    }

    pub(crate) fn vote(&self) {
        bump(&self.votes);
    }

    pub(crate) fn failure(&self) {
        bump(&self.failures);
    }

    pub(crate) fn skip(&self) {
        bump(&self.skipped);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            pages: get(&self.pages),
            cache_hits: get(&self.cache_hits),
            network_fetches: get(&self.network_fetches),
            members: get(&self.members),
            bills: get(&self.bills),
            roll_calls: get(&self.roll_calls),
            votes: get(&self.votes),
            failures: get(&self.failures),
            skipped: get(&self.skipped),
        }
    }
}
