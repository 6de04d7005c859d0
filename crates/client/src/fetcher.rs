//! AsyncFetcher: cache-first fetches delivered to continuations.
//!
//! Every [`AsyncFetcher::fetch`] call spawns one tracked task which
//!
//! 1. looks the fingerprint up in the [`ContentCache`]; a fresh record whose
//!    blob reads back is served without touching admission or the network,
//! 2. evicts an expired record,
//! 3. waits for an admission slot on the request's host (or for
//!    cancellation, whichever comes first),
//! 4. sends the request,
//! 5. stores the body and registers a record expiring `ttl` from now; a
//!    failed store is logged and the bytes are still delivered, but a
//!    systemic store failure also cancels the fetcher,
//! 6. frees the slot and hands the outcome to the continuation.
//!
//! Transient failures in steps 1, 2, 4 and 5 (network errors, retryable
//! statuses, blob I/O, a busy database) are retried under the same
//! [`RetryPolicy`].
//!
//! The continuation runs exactly once per call, on the spawned task, with
//! either the bytes or the error that ended the fetch.

use crate::admission::AdmissionController;
use crate::fetch::{FetchRequest, Transport};
use crate::retry::RetryPolicy;
use bytes::Bytes;
use dotgraph_core::cache::Lookup;
use dotgraph_core::{ContentCache, Error};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Per-call cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// How long a freshly fetched body stays valid.
    pub ttl: chrono::Duration,
}

impl CacheOptions {
    pub fn ttl(ttl: chrono::Duration) -> Self {
        Self { ttl }
    }
}

/// Where the delivered bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Bytes,
    pub source: FetchSource,
}

/// What a continuation receives: its own request back, plus the outcome.
#[derive(Debug)]
pub struct Completion<C> {
    pub request: FetchRequest<C>,
    pub result: Result<Fetched, Error>,
}

struct Inner {
    cache: ContentCache,
    transport: Arc<dyn Transport>,
    admission: AdmissionController,
    retry: RetryPolicy,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

/// Cache-first fetcher with per-host admission and completion tracking.
///
/// Cheap to clone; clones share the cache, admission pools, task tracker
/// and cancellation token.
#[derive(Clone)]
pub struct AsyncFetcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AsyncFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFetcher")
            .field("per_host", &self.inner.admission.per_host())
            .field("retry", &self.inner.retry)
            .field("in_flight", &self.inner.tracker.len())
            .finish_non_exhaustive()
    }
}

impl AsyncFetcher {
    pub fn new(
        cache: ContentCache, transport: Arc<dyn Transport>, admission: AdmissionController, retry: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                transport,
                admission,
                retry,
                tracker: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Fetch `request` and hand the outcome to `continuation`.
    ///
    /// Returns immediately; the continuation never runs on the caller's
    /// stack. Continuations may call `fetch` again to fan out.
    pub fn fetch<C, F, Fut>(&self, request: FetchRequest<C>, options: CacheOptions, continuation: F)
    where
        C: Send + Sync + 'static,
        F: FnOnce(Completion<C>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.inner.tracker.spawn(async move {
            let result = inner.resolve(&request, options).await;
            if let Err(e) = &result {
                tracing::debug!(url = %request.redacted_url(), error = %e, "fetch failed");
            }
            continuation(Completion { request, result }).await;
        });
    }

    /// Stop admitting new network fetches.
    ///
    /// Requests waiting for a slot or sleeping between retries complete with
    /// [`Error::Cancelled`]; fresh cache hits are still served.
    pub fn cancel(&self) {
        if !self.inner.cancel.is_cancelled() {
            tracing::info!("fetcher cancelled");
        }
        self.inner.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Wait until every fetch, and every fetch its continuations started, has finished.
    pub async fn drain(&self) {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.tracker.reopen();
    }

    /// Fetch tasks spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.inner.admission
    }
}

impl Inner {
    async fn resolve<C>(&self, request: &FetchRequest<C>, options: CacheOptions) -> Result<Fetched, Error> {
        let fingerprint = request.fingerprint();
        let url = request.redacted_url();
        let (cache, fp) = (&self.cache, &fingerprint);

        match self.retrying("cache lookup", &url, move || cache.lookup(fp)).await? {
            Lookup::Fresh(_) => {
                if let Some(bytes) = cache.read_blob(fp).await {
                    tracing::trace!(%fingerprint, "cache hit");
                    return Ok(Fetched { bytes, source: FetchSource::Cache });
                }
            }
            Lookup::Expired(record) => {
                tracing::debug!(%fingerprint, expired_at = %record.expires_at, "cache entry expired");
                if let Err(e) = self.retrying("cache evict", &url, move || cache.evict(fp)).await {
                    if e.is_systemic() || matches!(e, Error::Cancelled) {
                        return Err(e);
                    }
                    // a leftover blob is overwritten by the store below
                    tracing::warn!(%fingerprint, url = %url, error = %e, "failed to evict expired entry");
                }
            }
            Lookup::Absent => {}
        }

        let token = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            token = self.admission.acquire(request.host()) => token?,
        };

        let (transport, method, target) = (&self.transport, request.method(), request.url());
        let bytes = match self.retrying("fetch", &url, move || transport.send(method, target)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.admission.release(token);
                return Err(e);
            }
        };

        let (body, record_url, ttl) = (&bytes[..], url.as_str(), options.ttl);
        let stored = self
            .retrying("cache store", &url, move || cache.store(fp, method.as_str(), record_url, body, ttl))
            .await;
        match stored {
            Ok(_) => {}
            Err(e) if e.is_systemic() => {
                tracing::error!(%fingerprint, url = %url, error = %e, "cache store unusable, cancelling fetcher");
                self.cancel.cancel();
            }
            Err(e) => tracing::warn!(%fingerprint, url = %url, error = %e, "failed to cache response"),
        }

        self.admission.release(token);
        Ok(Fetched { bytes, source: FetchSource::Network })
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// Backoff sleeps end early with [`Error::Cancelled`] once the fetcher is cancelled.
    async fn retrying<T, F, Fut>(&self, stage: &'static str, url: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let backoff = self.retry.delay_for(attempt);
                    tracing::warn!(
                        stage,
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying after backoff"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
