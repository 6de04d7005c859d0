//! CrawlOrchestrator: the congress.gov ingestion pipeline.
//!
//! Stages, each a continuation of the previous stage's fetch:
//!
//! ```text
//! members ──(next page)──> members
//! congresses ──> bills(congress) ──(next page)──> bills
//!                   └──> actions(bill) ──(next page)──> actions
//!                           └──> House roll call | Senate roll call ──> VOTED edges
//! ```
//!
//! A handler error drops only its own branch. Systemic errors (cache or
//! graph store unusable) cancel the fetcher, which stops new stages from
//! being admitted.

use crate::context::{ActionsContext, BillsContext, Chamber, RollCallContext};
use crate::endpoints::Endpoints;
use crate::project;
use crate::records::{self, ActionsPage, BillsPage, CongressPage, MembersPage, Paged};
use crate::shapes::{EDGE_SHAPES, NODE_SHAPES};
use crate::stats::{CrawlStats, StatsSnapshot};
use bytes::Bytes;
use dotgraph_client::{AsyncFetcher, CacheOptions, Completion, FetchRequest};
use dotgraph_core::{AppConfig, ConfigError, Error, GraphUpsertService};
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

/// Future returned by a stage handler.
type StageFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send>>;

static CONGRESS_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"congress/(\d+)").expect("invalid congress regex"));

/// Pipeline stage, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Members,
    Congresses,
    Bills,
    Actions,
    HouseRollCall,
    SenateRollCall,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Members => "members",
            Stage::Congresses => "congresses",
            Stage::Bills => "bills",
            Stage::Actions => "actions",
            Stage::HouseRollCall => "house_roll_call",
            Stage::SenateRollCall => "senate_roll_call",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawl parameters.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    /// Congresses, newest first, whose bills are crawled.
    pub max_congresses: usize,
    /// TTL for every page of the member, congress and bill listings.
    pub listing_ttl: chrono::Duration,
    /// TTL for bill actions and roll-call documents.
    pub archival_ttl: chrono::Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: config.congress_api_base.clone(),
            api_key: Some(config.require_congress_api_key()?.to_string()),
            max_congresses: config.max_congresses,
            listing_ttl: config.cache_ttl(),
            archival_ttl: config.archival_ttl(),
        })
    }
}

struct Shared {
    fetcher: AsyncFetcher,
    graph: GraphUpsertService,
    endpoints: Endpoints,
    settings: CrawlSettings,
    stats: CrawlStats,
}

/// Drives the crawl through an [`AsyncFetcher`] into a [`GraphUpsertService`].
#[derive(Clone)]
pub struct CrawlOrchestrator {
    shared: Arc<Shared>,
}

impl CrawlOrchestrator {
    pub fn new(fetcher: AsyncFetcher, graph: GraphUpsertService, settings: CrawlSettings) -> Result<Self, Error> {
        let endpoints = Endpoints::new(&settings.api_base, settings.api_key.clone())?;
        Ok(Self { shared: Arc::new(Shared { fetcher, graph, endpoints, settings, stats: CrawlStats::default() }) })
    }

    /// Ensure graph constraints, then issue the two top-level fetches.
    ///
    /// Returns once they are issued; use [`CrawlOrchestrator::run`] or drain
    /// the fetcher to wait for the whole crawl.
    pub async fn start(&self) -> Result<(), Error> {
        let shared = &self.shared;
        shared.graph.ensure_constraints(NODE_SHAPES, EDGE_SHAPES).await?;

        let members = FetchRequest::get(&shared.endpoints.members()?, ())?;
        let congresses = FetchRequest::get(&shared.endpoints.congresses()?, ())?;
        tracing::info!(max_congresses = shared.settings.max_congresses, "crawl started");

        shared.issue(Stage::Members, members, shared.ttl_for(Stage::Members), Shared::on_members);
        shared.issue(Stage::Congresses, congresses, shared.ttl_for(Stage::Congresses), Shared::on_congresses);
        Ok(())
    }

    /// Start the crawl and wait for every stage to finish.
    pub async fn run(&self) -> Result<StatsSnapshot, Error> {
        self.start().await?;
        self.shared.fetcher.drain().await;
        let stats = self.stats();
        tracing::info!(
            pages = stats.pages,
            members = stats.members,
            bills = stats.bills,
            votes = stats.votes,
            failures = stats.failures,
            cancelled = self.shared.fetcher.is_cancelled(),
            "crawl finished"
        );
        Ok(stats)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn fetcher(&self) -> &AsyncFetcher {
        &self.shared.fetcher
    }
}

impl Shared {
    /// Fetch `request` and run `handler` on its bytes; failures end the branch.
    fn issue<C, H>(self: &Arc<Self>, stage: Stage, request: FetchRequest<C>, ttl: chrono::Duration, handler: H)
    where
        C: Send + Sync + 'static,
        H: FnOnce(Arc<Self>, C, Bytes) -> StageFuture + Send + 'static,
    {
        if self.fetcher.is_cancelled() {
            self.stats.skip();
            tracing::debug!(%stage, url = %request.redacted_url(), "crawl cancelled, fetch not issued");
            return;
        }

        let this = Arc::clone(self);
        self.fetcher.fetch(request, CacheOptions::ttl(ttl), move |done: Completion<C>| async move {
            let url = done.request.redacted_url();
            let outcome = match done.result {
                Ok(fetched) => {
                    this.stats.fetched(fetched.source);
                    handler(this.clone(), done.request.context, fetched.bytes).await
                }
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                this.branch_failed(stage, &url, &e);
            }
        });
    }

    /// Issue the next page of a paginated listing with the same handler.
    ///
    /// Every page of a listing is cached under the TTL of the stage's first page.
    fn follow<C, H>(self: &Arc<Self>, stage: Stage, next: &str, context: C, handler: H) -> Result<(), Error>
    where
        C: Send + Sync + 'static,
        H: FnOnce(Arc<Self>, C, Bytes) -> StageFuture + Send + 'static,
    {
        let request = FetchRequest::get(&self.endpoints.authorize(next)?, context)?;
        tracing::debug!(%stage, url = %request.redacted_url(), "following next page");
        self.issue(stage, request, self.ttl_for(stage), handler);
        Ok(())
    }

    /// Live listings expire on the listing TTL; per-bill actions and roll
    /// calls are dated records and use the archival TTL.
    fn ttl_for(&self, stage: Stage) -> chrono::Duration {
        match stage {
            Stage::Members | Stage::Congresses | Stage::Bills => self.settings.listing_ttl,
            Stage::Actions | Stage::HouseRollCall | Stage::SenateRollCall => self.settings.archival_ttl,
        }
    }

    fn branch_failed(&self, stage: Stage, url: &str, error: &Error) {
        match error {
            Error::Cancelled => {
                self.stats.skip();
                tracing::debug!(%stage, url, "fetch cancelled");
            }
            e if e.is_systemic() => {
                self.stats.failure();
                tracing::error!(%stage, url, error = %e, "systemic failure, halting crawl intake");
                self.fetcher.cancel();
            }
            e => {
                self.stats.failure();
                tracing::warn!(%stage, url, error = %e, "crawl branch dropped");
            }
        }
    }

    /// Keep going past a per-entity error unless it is systemic.
    fn tolerate(&self, stage: Stage, result: Result<(), Error>) -> Result<bool, Error> {
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.is_systemic() => Err(e),
            Err(e) => {
                self.stats.failure();
                tracing::warn!(%stage, error = %e, "entity skipped");
                Ok(false)
            }
        }
    }

    fn on_members(self: Arc<Self>, _: (), bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let page: MembersPage = records::decode(&bytes)?;
            if let Some(next) = page.next_page() {
                self.follow(Stage::Members, next, (), Self::on_members)?;
            }

            for member in &page.members {
                let node = project::member_node(member);
                if self.tolerate(Stage::Members, self.graph.upsert_node(&node, true).await)? {
                    self.stats.member();
                }
            }
            tracing::debug!(members = page.members.len(), "members page processed");
            Ok(())
        })
    }

    fn on_congresses(self: Arc<Self>, _: (), bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let page: CongressPage = records::decode(&bytes)?;

            for item in page.congresses.iter().take(self.settings.max_congresses) {
                let Some(congress) = item
                    .url
                    .as_deref()
                    .and_then(|u| CONGRESS_NUMBER.captures(u))
                    .and_then(|c| c[1].parse::<u32>().ok())
                else {
                    tracing::warn!(name = ?item.name, "congress without a number, skipped");
                    continue;
                };

                let request = FetchRequest::get(&self.endpoints.bills(congress)?, BillsContext { congress })?;
                self.issue(Stage::Bills, request, self.ttl_for(Stage::Bills), Self::on_bills);
            }
            Ok(())
        })
    }

    fn on_bills(self: Arc<Self>, ctx: BillsContext, bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let page: BillsPage = records::decode(&bytes)?;
            if let Some(next) = page.next_page() {
                self.follow(Stage::Bills, next, ctx.clone(), Self::on_bills)?;
            }

            for bill in &page.bills {
                let Some(key) = project::bill_key(bill) else {
                    self.stats.failure();
                    tracing::warn!(congress = ctx.congress, number = ?bill.number, "bill without chamber code or number, skipped");
                    continue;
                };

                let node = project::bill_node(&key, bill);
                if !self.tolerate(Stage::Bills, self.graph.upsert_node(&node, true).await)? {
                    continue;
                }
                self.stats.bill();

                let Some(bill_url) = bill.url.as_deref() else { continue };
                let request = self
                    .endpoints
                    .actions(bill_url)
                    .and_then(|url| FetchRequest::get(&url, ActionsContext { bill: key }));
                match request {
                    Ok(request) => self.issue(Stage::Actions, request, self.ttl_for(Stage::Actions), Self::on_actions),
                    Err(e) => {
                        self.tolerate(Stage::Bills, Err(e))?;
                    }
                }
            }
            Ok(())
        })
    }

    fn on_actions(self: Arc<Self>, ctx: ActionsContext, bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let page: ActionsPage = records::decode(&bytes)?;
            if let Some(next) = page.next_page() {
                self.follow(Stage::Actions, next, ctx.clone(), Self::on_actions)?;
            }

            for action in page.actions.iter().filter(|a| a.is_floor()) {
                let action_date = action.action_date.clone().unwrap_or_default();
                for recorded in &action.recorded_votes {
                    let (Some(url), Some(roll_number)) = (recorded.url.as_deref(), recorded.roll_number) else {
                        continue;
                    };
                    let Some(chamber) = Chamber::for_roll_call_url(url) else {
                        tracing::debug!(bill = %ctx.bill, url, "roll call from unknown publisher, skipped");
                        continue;
                    };

                    let context =
                        RollCallContext { bill: ctx.bill.clone(), action_date: action_date.clone(), chamber, roll_number };
                    let request = match FetchRequest::get(url, context) {
                        Ok(request) => request,
                        Err(e) => {
                            self.tolerate(Stage::Actions, Err(e))?;
                            continue;
                        }
                    };
                    match chamber {
                        Chamber::House => {
                            let ttl = self.ttl_for(Stage::HouseRollCall);
                            self.issue(Stage::HouseRollCall, request, ttl, Self::on_house_roll_call);
                        }
                        Chamber::Senate => {
                            let ttl = self.ttl_for(Stage::SenateRollCall);
                            self.issue(Stage::SenateRollCall, request, ttl, Self::on_senate_roll_call);
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn on_house_roll_call(self: Arc<Self>, ctx: RollCallContext, bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let roll = records::parse_house(&bytes)?;
            self.stats.roll_call();

            for vote in &roll.votes {
                let voter = project::house_voter_node(vote);
                if !self.tolerate(Stage::HouseRollCall, self.graph.upsert_node(&voter, true).await)? {
                    continue;
                }
                let edge = project::voted_edge(&ctx, &voter, &vote.vote);
                if self.tolerate(Stage::HouseRollCall, self.graph.upsert_edge(&edge, true).await)? {
                    self.stats.vote();
                }
            }
            tracing::debug!(bill = %ctx.bill, roll = ctx.roll_number, votes = roll.votes.len(), "house roll call processed");
            Ok(())
        })
    }

    fn on_senate_roll_call(self: Arc<Self>, ctx: RollCallContext, bytes: Bytes) -> StageFuture {
        Box::pin(async move {
            let roll = records::parse_senate(&bytes)?;
            self.stats.roll_call();

            for vote in &roll.votes {
                let voter = project::senate_voter_node(vote);
                if !self.tolerate(Stage::SenateRollCall, self.graph.upsert_node(&voter, true).await)? {
                    continue;
                }
                let edge = project::voted_edge(&ctx, &voter, &vote.vote);
                if self.tolerate(Stage::SenateRollCall, self.graph.upsert_edge(&edge, true).await)? {
                    self.stats.vote();
                }
            }
            tracing::debug!(bill = %ctx.bill, roll = ctx.roll_number, votes = roll.votes.len(), "senate roll call processed");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{self, BillKey};
    use async_trait::async_trait;
    use dotgraph_client::{AdmissionController, Method, RetryPolicy, Transport};
    use dotgraph_core::cache::{CacheRecord, FsBlobStore, RecordStore};
    use dotgraph_core::Fingerprint;
    use dotgraph_core::graph::{
        AttrValue, EdgeDescriptor, EdgeShape, GraphStore, MemoryGraphStore, NodeDescriptor, NodeShape, UpsertMode,
        UpsertOutcome,
    };
    use dotgraph_core::{CacheDb, ContentCache};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "https://api.test/v3";
    const HOUSE_ROLL: &str = "https://clerk.house.gov/evs/2023/roll010.xml";
    const SENATE_ROLL: &str = "https://www.senate.gov/legislative/LIS/roll_call_votes/vote1181/vote_118_1_00005.xml";

    const MEMBERS_1: &str = r#"{
        "members": [{"bioguideId": "A000370", "name": "Adams, Alma S.", "partyName": "Democratic",
                     "state": "North Carolina", "terms": {"item": [{"chamber": "House of Representatives"}]}}],
        "pagination": {"count": 2, "next": "https://api.test/v3/member?offset=1&limit=1&format=json"}
    }"#;

    const MEMBERS_2: &str = r#"{
        "members": [{"bioguideId": "S000033", "name": "Sanders, Bernard", "partyName": "Independent",
                     "state": "Vermont", "terms": {"item": [{"chamber": "Senate"}]}}],
        "pagination": {"count": 2}
    }"#;

    const CONGRESSES: &str = r#"{"congresses": [
        {"name": "118th Congress", "url": "https://api.test/v3/congress/118?format=json"},
        {"name": "117th Congress", "url": "https://api.test/v3/congress/117?format=json"}
    ]}"#;

    const BILLS: &str = r#"{"bills": [
        {"congress": 118, "number": "1", "originChamber": "House", "originChamberCode": "H",
         "title": "Lower Energy Costs Act", "type": "HR", "url": "https://api.test/v3/bill/118/hr/1?format=json"},
        {"congress": 118, "title": "No number"}
    ]}"#;

    const BILLS_WITH_NEXT: &str = r#"{"bills": [
        {"congress": 118, "number": "1", "originChamber": "House", "originChamberCode": "H",
         "title": "Lower Energy Costs Act", "type": "HR", "url": "https://api.test/v3/bill/118/hr/1?format=json"}
    ], "pagination": {"count": 1, "next": "https://api.test/v3/bill/118?offset=250&limit=250&format=json"}}"#;

    const ACTIONS: &str = r#"{"actions": [
        {"actionDate": "2023-03-30", "type": "Floor", "text": "Passed",
         "recordedVotes": [
            {"chamber": "House", "congress": 118, "rollNumber": 10, "url": "https://clerk.house.gov/evs/2023/roll010.xml"},
            {"chamber": "Senate", "congress": 118, "rollNumber": 5,
             "url": "https://www.senate.gov/legislative/LIS/roll_call_votes/vote1181/vote_118_1_00005.xml"}
         ]},
        {"actionDate": "2023-01-09", "type": "IntroReferral", "text": "Introduced",
         "recordedVotes": [{"rollNumber": 99, "url": "https://clerk.house.gov/evs/2023/roll099.xml"}]}
    ]}"#;

    const HOUSE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rollcall-vote>
  <vote-metadata><rollcall-num>10</rollcall-num><action-date>30-Mar-2023</action-date></vote-metadata>
  <vote-data>
    <recorded-vote><legislator name-id="A000370" party="D" state="NC">Adams</legislator><vote>Yea</vote></recorded-vote>
    <recorded-vote><legislator name-id="B000001" party="R" state="TX">Babin</legislator><vote>Nay</vote></recorded-vote>
  </vote-data>
</rollcall-vote>"#;

    const SENATE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<roll_call_vote>
  <vote_date>March 30, 2023, 01:45 PM</vote_date>
  <members>
    <member><last_name>Sanders</last_name><first_name>Bernard</first_name><party>I</party><state>VT</state>
      <vote_cast>Yea</vote_cast><lis_member_id>S313</lis_member_id></member>
  </members>
</roll_call_vote>"#;

    /// Serves fixed bodies keyed by URL with the api key stripped.
    struct RoutedTransport {
        routes: HashMap<String, &'static str>,
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl RoutedTransport {
        fn new(routes: &[(String, &'static str)]) -> Self {
            Self { routes: routes.iter().cloned().collect(), seen: Mutex::new(Vec::new()), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn route_key(url: &url::Url) -> String {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "api_key")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut key = url.clone();
        if pairs.is_empty() {
            key.set_query(None);
        } else {
            key.query_pairs_mut().clear().extend_pairs(pairs);
        }
        key.to_string()
    }

    #[async_trait]
    impl Transport for RoutedTransport {
        async fn send(&self, _method: Method, url: &url::Url) -> Result<Bytes, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(url.to_string());
            match self.routes.get(&route_key(url)) {
                Some(body) => Ok(Bytes::from_static(body.as_bytes())),
                None => Err(Error::HttpStatus { status: 404, url: url.to_string() }),
            }
        }
    }

    fn routes() -> Vec<(String, &'static str)> {
        vec![
            (format!("{BASE}/member?format=json&currentMember=true&limit=250"), MEMBERS_1),
            (format!("{BASE}/member?offset=1&limit=1&format=json"), MEMBERS_2),
            (format!("{BASE}/congress?format=json"), CONGRESSES),
            (format!("{BASE}/bill/118?format=json&limit=250"), BILLS),
            (format!("{BASE}/bill/118/hr/1/actions?format=json"), ACTIONS),
            (HOUSE_ROLL.to_string(), HOUSE_XML),
            (SENATE_ROLL.to_string(), SENATE_XML),
        ]
    }

    struct Harness {
        _dir: tempfile::TempDir,
        db: Arc<CacheDb>,
        blobs: Arc<FsBlobStore>,
    }

    impl Harness {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = Arc::new(CacheDb::open(dir.path().join("cache.sqlite")).await.unwrap());
            let blobs = Arc::new(FsBlobStore::new(dir.path().join("blobs")).await.unwrap());
            Self { _dir: dir, db, blobs }
        }

        fn orchestrator(&self, transport: Arc<RoutedTransport>, store: Arc<dyn GraphStore>) -> CrawlOrchestrator {
            self.orchestrator_with_records(self.db.clone(), transport, store)
        }

        fn orchestrator_with_records(
            &self, records: Arc<dyn RecordStore>, transport: Arc<RoutedTransport>, store: Arc<dyn GraphStore>,
        ) -> CrawlOrchestrator {
            let cache = ContentCache::new(records, self.blobs.clone());
            let fetcher = AsyncFetcher::new(cache, transport, AdmissionController::new(2), RetryPolicy::none());
            let settings = CrawlSettings {
                api_base: BASE.into(),
                api_key: Some("k3y".into()),
                max_congresses: 1,
                listing_ttl: chrono::Duration::hours(1),
                archival_ttl: chrono::Duration::days(3650),
            };
            CrawlOrchestrator::new(fetcher, GraphUpsertService::new(store), settings).unwrap()
        }
    }

    #[tokio::test]
    async fn test_full_crawl_builds_vote_graph() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));
        let graph = Arc::new(MemoryGraphStore::new());

        let stats = harness.orchestrator(transport.clone(), graph.clone()).run().await.unwrap();

        assert_eq!(graph.count_label("Person"), 4);
        assert_eq!(graph.count_label("Bill"), 1);
        assert_eq!(graph.count_rel_type("VOTED"), 3);
        assert_eq!(stats.members, 2);
        assert_eq!(stats.bills, 1);
        assert_eq!(stats.roll_calls, 2);
        assert_eq!(stats.votes, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(transport.calls(), 7);

        let adams = graph.node("Person", &identity::person_id("A000370")).unwrap();
        assert_eq!(adams.get("last"), Some(&AttrValue::String("Adams".into())));
        let bill = graph.node("Bill", &BillKey::new(118, "H", "1").id()).unwrap();
        assert_eq!(bill.get("title"), Some(&AttrValue::String("Lower Energy Costs Act".into())));
        let sanders_lis = graph.node("Person", &identity::senate_person_id("S313")).unwrap();
        assert_eq!(sanders_lis.get("lisMemberId"), Some(&AttrValue::String("S313".into())));
    }

    #[tokio::test]
    async fn test_api_key_only_sent_to_api_host() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));

        harness.orchestrator(transport.clone(), Arc::new(MemoryGraphStore::new())).run().await.unwrap();

        let seen = transport.seen.lock().unwrap().clone();
        for url in &seen {
            let has_key = url.contains("api_key=k3y");
            assert_eq!(has_key, url.starts_with(BASE), "{url}");
        }
    }

    #[tokio::test]
    async fn test_second_run_is_cached_and_idempotent() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));
        let graph = Arc::new(MemoryGraphStore::new());

        harness.orchestrator(transport.clone(), graph.clone()).run().await.unwrap();
        let (nodes, edges, calls) = (graph.node_count(), graph.edge_count(), transport.calls());

        let stats = harness.orchestrator(transport.clone(), graph.clone()).run().await.unwrap();

        assert_eq!(transport.calls(), calls);
        assert_eq!(stats.network_fetches, 0);
        assert_eq!(stats.cache_hits, stats.pages);
        assert_eq!((graph.node_count(), graph.edge_count()), (nodes, edges));
    }

    #[tokio::test]
    async fn test_decode_failure_drops_only_its_branch() {
        let harness = Harness::new().await;
        let mut routes = routes();
        for route in routes.iter_mut() {
            if route.0.contains("/bill/118?") {
                route.1 = "<html>Too Many Requests</html>";
            }
        }
        let transport = Arc::new(RoutedTransport::new(&routes));
        let graph = Arc::new(MemoryGraphStore::new());

        let stats = harness.orchestrator(transport, graph.clone()).run().await.unwrap();

        assert_eq!(stats.members, 2);
        assert_eq!(stats.bills, 0);
        assert_eq!(stats.failures, 1);
        assert_eq!(graph.count_rel_type("VOTED"), 0);
    }

    #[tokio::test]
    async fn test_missing_roll_call_does_not_affect_siblings() {
        let harness = Harness::new().await;
        let routes: Vec<_> = routes().into_iter().filter(|(url, _)| url != SENATE_ROLL).collect();
        let transport = Arc::new(RoutedTransport::new(&routes));
        let graph = Arc::new(MemoryGraphStore::new());

        let stats = harness.orchestrator(transport, graph.clone()).run().await.unwrap();

        assert_eq!(stats.roll_calls, 1);
        assert_eq!(graph.count_rel_type("VOTED"), 2);
        assert!(stats.failures >= 2);
    }

    struct UnreachableGraph;

    #[async_trait]
    impl GraphStore for UnreachableGraph {
        async fn upsert_node(&self, _: &NodeDescriptor, _: UpsertMode) -> Result<UpsertOutcome, Error> {
            Err(Error::Graph("connection refused".into()))
        }

        async fn upsert_edge(&self, _: &EdgeDescriptor, _: UpsertMode) -> Result<UpsertOutcome, Error> {
            Err(Error::Graph("connection refused".into()))
        }

        async fn ensure_constraints(&self, _: &[&'static NodeShape], _: &[&'static EdgeShape]) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_systemic_failure_halts_intake() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));
        let orchestrator = harness.orchestrator(transport, Arc::new(UnreachableGraph));

        let stats = orchestrator.run().await.unwrap();

        assert!(orchestrator.fetcher().is_cancelled());
        assert!(stats.failures >= 1);
        assert_eq!(stats.votes, 0);
        assert_eq!(stats.roll_calls, 0);
    }

    #[tokio::test]
    async fn test_cancelled_crawl_issues_nothing() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));
        let orchestrator = harness.orchestrator(transport.clone(), Arc::new(MemoryGraphStore::new()));
        orchestrator.fetcher().cancel();

        let stats = orchestrator.run().await.unwrap();

        assert_eq!(transport.calls(), 0);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.pages, 0);
    }

    #[test]
    fn test_settings_require_api_key() {
        assert!(CrawlSettings::from_config(&AppConfig::default()).is_err());

        let config = AppConfig { congress_api_key: Some("k".into()), ..AppConfig::default() };
        let settings = CrawlSettings::from_config(&config).unwrap();
        assert_eq!(settings.max_congresses, 3);
        assert_eq!(settings.archival_ttl, chrono::Duration::days(3650));
    }

    #[tokio::test]
    async fn test_every_bill_listing_page_uses_listing_ttl() {
        let harness = Harness::new().await;
        let mut routes = routes();
        for route in routes.iter_mut() {
            if route.0.contains("/bill/118?") {
                route.1 = BILLS_WITH_NEXT;
            }
        }
        routes.push((format!("{BASE}/bill/118?offset=250&limit=250&format=json"), r#"{"bills": []}"#));
        let transport = Arc::new(RoutedTransport::new(&routes));

        harness.orchestrator(transport.clone(), Arc::new(MemoryGraphStore::new())).run().await.unwrap();

        let records = harness.db.list_records().await.unwrap();
        let ttl_of = |r: &CacheRecord| r.expires_at - r.fetched_at;
        let bill_pages: Vec<_> = records.iter().filter(|r| r.url.contains("/bill/118?")).collect();
        assert_eq!(bill_pages.len(), 2);
        for page in bill_pages {
            assert!(ttl_of(page) <= chrono::Duration::hours(1), "{}", page.url);
        }

        let member_pages: Vec<_> = records.iter().filter(|r| r.url.contains("/member?")).collect();
        assert_eq!(member_pages.len(), 2);
        assert!(member_pages.iter().all(|r| ttl_of(r) <= chrono::Duration::hours(1)));

        let actions = records.iter().find(|r| r.url.contains("/actions?")).unwrap();
        assert!(ttl_of(actions) > chrono::Duration::days(3000));
    }

    /// Record store whose writes fail as if the database went away.
    struct ClosedRecords(Arc<CacheDb>);

    #[async_trait]
    impl RecordStore for ClosedRecords {
        async fn find(&self, fingerprint: &Fingerprint) -> Result<Option<CacheRecord>, Error> {
            self.0.find(fingerprint).await
        }

        async fn insert(&self, _: &CacheRecord) -> Result<(), Error> {
            Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed))
        }

        async fn delete(&self, fingerprint: &Fingerprint) -> Result<(), Error> {
            self.0.delete(fingerprint).await
        }

        async fn list_all(&self) -> Result<Vec<CacheRecord>, Error> {
            self.0.list_all().await
        }
    }

    #[tokio::test]
    async fn test_cache_store_failure_halts_intake() {
        let harness = Harness::new().await;
        let transport = Arc::new(RoutedTransport::new(&routes()));
        let records = Arc::new(ClosedRecords(harness.db.clone()));
        let orchestrator =
            harness.orchestrator_with_records(records, transport.clone(), Arc::new(MemoryGraphStore::new()));

        let stats = orchestrator.run().await.unwrap();

        assert!(orchestrator.fetcher().is_cancelled());
        assert!(stats.skipped >= 1);
        assert_eq!(stats.bills, 0);
        assert_eq!(stats.votes, 0);
        assert!(transport.calls() <= 2);
    }
}
