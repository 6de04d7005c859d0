//! Per-host admission control.
//!
//! One semaphore per remote host, created lazily on the first request to
//! that host and kept for the life of the controller. The map lock covers
//! only the check-and-create step; permits are acquired on the pool itself.

use dotgraph_core::Error;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds in-flight fetches per host.
#[derive(Debug)]
pub struct AdmissionController {
    per_host: usize,
    pools: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// A held admission slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionToken {
    host: String,
    _permit: OwnedSemaphorePermit,
}

impl AdmissionToken {
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl AdmissionController {
    /// `per_host` is clamped to at least one slot.
    pub fn new(per_host: usize) -> Self {
        Self { per_host: per_host.max(1), pools: Mutex::new(HashMap::new()) }
    }

    pub fn per_host(&self) -> usize {
        self.per_host
    }

    /// Wait for a free slot on `host`.
    pub async fn acquire(&self, host: &str) -> Result<AdmissionToken, Error> {
        let pool = self.pool(host);
        let permit = pool.clone().acquire_owned().await.map_err(|_| Error::Cancelled)?;
        tracing::trace!(host, available = pool.available_permits(), "admission slot acquired");
        Ok(AdmissionToken { host: host.to_string(), _permit: permit })
    }

    /// Return a slot to its pool.
    pub fn release(&self, token: AdmissionToken) {
        tracing::trace!(host = %token.host, "admission slot released");
        drop(token);
    }

    /// Free slots on `host`, or `None` if no request has reached it yet.
    pub fn available(&self, host: &str) -> Option<usize> {
        self.lock().get(host).map(|pool| pool.available_permits())
    }

    /// Number of hosts with a pool.
    pub fn host_count(&self) -> usize {
        self.lock().len()
    }

    fn pool(&self, host: &str) -> Arc<Semaphore> {
        let mut pools = self.lock();
        pools
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Semaphore>>> {
        self.pools.lock().unwrap_or_else(|e| e.into_inner())
    }
}
