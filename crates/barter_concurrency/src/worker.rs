//! # Tenant Worker
//!
//! One background thread per tenant, consuming graph mutation events from a
//! bounded channel and reconciling the Active Loop Cache against them (§5).
//! Mirrors the teacher's tick loop (`oroboros_networking::server::InfernoServer::tick`,
//! which drains every buffered network event with `try_recv` before doing a
//! unit of work): rather than running the discovery pipeline once per
//! mutation, the worker drains everything currently buffered and runs one
//! pipeline pass per batch, so a burst of mutations costs one recomputation
//! instead of many.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

use barter_cache::{ActiveLoopCache, CachedLoop, CachedStep, LoopStatus};
use barter_core::{EngineError, EngineResult, GraphSnapshot, TenantConfig, TenantGraph};
use barter_discovery::{affected_community, discover, CandidateCycle, Edge, UnifiedGraphView};
use barter_scoring::{filter_and_rank, score, LoopCandidate, ScoreVector, ScoredLoop, ScoringStep};
use barter_shared::{GraphEvent, TenantId};

/// How long the worker blocks waiting for the first message of a new batch
/// before checking whether it should keep polling. Kept short so a stopped
/// worker's thread exits promptly.
const RECV_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

enum WorkerMessage {
    Mutated(GraphEvent),
    Shutdown,
}

/// A snapshot of one tenant's worker health, for `get_tenant_status` (§6).
#[derive(Clone, Debug)]
pub struct TenantStatus {
    /// Wallets currently in the graph.
    pub wallet_count: usize,
    /// NFTs currently in the graph.
    pub nft_count: usize,
    /// Current generation.
    pub generation: u64,
    /// Loops currently held in the Active Loop Cache.
    pub cache_size: usize,
    /// Mutation events buffered and not yet reconciled.
    pub worker_backlog: usize,
    /// The most recent unrecoverable error the worker encountered, if any.
    pub last_error: Option<String>,
    /// Whether the most recent discovery pass exhausted its wall-clock
    /// budget, per §7's `Timeout` policy.
    pub time_bounded: bool,
}

/// One tenant's live graph, cache, and dedicated worker thread.
pub struct TenantHandle {
    tenant: TenantId,
    graph: Arc<TenantGraph>,
    cache: Arc<ActiveLoopCache>,
    config: Arc<RwLock<TenantConfig>>,
    sender: Sender<WorkerMessage>,
    join: Option<JoinHandle<()>>,
    backlog: Arc<AtomicUsize>,
    last_error: Arc<RwLock<Option<String>>>,
    time_bounded: Arc<AtomicBool>,
}

impl TenantHandle {
    /// Creates a tenant, its graph, its cache, and spawns its worker thread.
    #[must_use]
    pub fn spawn(tenant: TenantId, config: TenantConfig) -> Self {
        let graph = TenantGraph::new(tenant.clone());
        let cache = ActiveLoopCache::new(tenant.clone());
        Self::spawn_with_state(tenant, config, graph, cache)
    }

    /// Creates a tenant from an already-built graph and cache, spawning its
    /// worker thread over them. Used to resume a tenant from a persistence
    /// snapshot (§6, `restore_tenant`) instead of starting empty.
    #[must_use]
    pub fn spawn_with_state(
        tenant: TenantId,
        config: TenantConfig,
        graph: TenantGraph,
        cache: ActiveLoopCache,
    ) -> Self {
        let capacity = config.event_channel_capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        let graph = Arc::new(graph);
        let cache = Arc::new(cache);
        let config = Arc::new(RwLock::new(config));
        let backlog = Arc::new(AtomicUsize::new(0));
        let last_error = Arc::new(RwLock::new(None));
        let time_bounded = Arc::new(AtomicBool::new(false));

        let join = std::thread::Builder::new()
            .name(format!("barter-worker-{tenant}"))
            .spawn({
                let tenant = tenant.clone();
                let graph = Arc::clone(&graph);
                let cache = Arc::clone(&cache);
                let config = Arc::clone(&config);
                let backlog = Arc::clone(&backlog);
                let last_error = Arc::clone(&last_error);
                let time_bounded = Arc::clone(&time_bounded);
                move || run_worker(tenant, graph, cache, config, receiver, backlog, last_error, time_bounded)
            })
            .expect("spawning tenant worker thread");

        Self {
            tenant,
            graph,
            cache,
            config,
            sender,
            join: Some(join),
            backlog,
            last_error,
            time_bounded,
        }
    }

    /// The tenant's live graph. Mutations go straight through it; the
    /// generated [`GraphEvent`] is then handed to [`TenantHandle::notify`].
    #[must_use]
    pub fn graph(&self) -> &Arc<TenantGraph> {
        &self.graph
    }

    /// The tenant's Active Loop Cache, for query operations. Reads never
    /// suspend beyond the cache's own read-lock acquisition (§5).
    #[must_use]
    pub fn cache(&self) -> &Arc<ActiveLoopCache> {
        &self.cache
    }

    /// Replaces the tenant's configuration in place.
    pub fn set_config(&self, config: TenantConfig) {
        *self.config.write() = config;
    }

    /// A copy of the tenant's current configuration.
    #[must_use]
    pub fn config(&self) -> TenantConfig {
        self.config.read().clone()
    }

    /// Enqueues a mutation event for the worker to reconcile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantBusy`] if the channel is saturated
    /// (§5, backpressure).
    pub fn notify(&self, event: GraphEvent) -> EngineResult<()> {
        match self.sender.try_send(WorkerMessage::Mutated(event)) {
            Ok(()) => {
                self.backlog.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(EngineError::TenantBusy { retry_after_ms: 50 }),
            Err(TrySendError::Disconnected(_)) => Err(EngineError::InternalInconsistency(
                "tenant worker thread is gone".to_string(),
            )),
        }
    }

    /// Whether the most recent discovery pass against this tenant's graph
    /// exhausted its wall-clock budget (§7, `Timeout`), leaving the Active
    /// Loop Cache possibly incomplete for the generation it reconciled.
    #[must_use]
    pub fn time_bounded(&self) -> bool {
        self.time_bounded.load(Ordering::Acquire)
    }

    /// A point-in-time health snapshot for this tenant.
    #[must_use]
    pub fn status(&self) -> TenantStatus {
        let snapshot = self.graph.snapshot();
        TenantStatus {
            wallet_count: snapshot.wallets().count(),
            nft_count: snapshot.nfts().count(),
            generation: snapshot.generation(),
            cache_size: self.cache.len(),
            worker_backlog: self.backlog.load(Ordering::Acquire),
            last_error: self.last_error.read().clone(),
            time_bounded: self.time_bounded(),
        }
    }

    /// Signals the worker thread to stop after draining its current batch.
    pub fn shutdown(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!(tenant = %self.tenant, "tenant worker thread panicked during shutdown");
            }
        }
    }
}

impl Drop for TenantHandle {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    tenant: TenantId,
    graph: Arc<TenantGraph>,
    cache: Arc<ActiveLoopCache>,
    config: Arc<RwLock<TenantConfig>>,
    receiver: Receiver<WorkerMessage>,
    backlog: Arc<AtomicUsize>,
    last_error: Arc<RwLock<Option<String>>>,
    time_bounded: Arc<AtomicBool>,
) {
    info!(%tenant, "tenant worker started");

    loop {
        let first = match receiver.recv_timeout(RECV_POLL_INTERVAL) {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let mut events = Vec::new();
        let mut stop = false;
        match first {
            WorkerMessage::Mutated(event) => events.push(event),
            WorkerMessage::Shutdown => stop = true,
        }
        while let Ok(message) = receiver.try_recv() {
            match message {
                WorkerMessage::Mutated(event) => events.push(event),
                WorkerMessage::Shutdown => stop = true,
            }
        }
        backlog.fetch_sub(events.len().min(backlog.load(Ordering::Acquire)), Ordering::AcqRel);

        if !events.is_empty() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                reconcile(&tenant, &graph, &cache, &config, &events, &time_bounded);
            }));
            if let Err(payload) = outcome {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tenant worker panicked".to_string());
                error!(%tenant, error = %message, "reconciliation panicked; community marked for full re-discovery");
                *last_error.write() = Some(message);
                cache.invalidate_all();
            }
        }

        if stop {
            break;
        }
    }

    info!(%tenant, "tenant worker stopped");
}

/// One candidate loop carried through scoring into a cache insertion.
struct Reconciled {
    cycle: CandidateCycle,
    vector: ScoreVector,
    aggregate: f64,
}

/// Invalidates cache entries touched by `events`, then runs the discovery
/// pipeline once and installs surviving loops if the tenant's generation has
/// not advanced past the snapshot the pipeline ran against (§5, "generation
/// numbers"). A mismatch means a newer mutation arrived mid-computation; its
/// own batch will trigger another pass, so the stale result is simply
/// dropped rather than retried here.
fn reconcile(
    tenant: &TenantId,
    graph: &TenantGraph,
    cache: &ActiveLoopCache,
    config: &RwLock<TenantConfig>,
    events: &[GraphEvent],
    time_bounded: &AtomicBool,
) {
    let snapshot = graph.snapshot();
    let config = config.read().clone();
    let view = UnifiedGraphView::new(&snapshot, config.features.collection_wants);

    let mut broad = false;
    for event in events {
        let community = affected_community(event, &view, config.max_depth, config.max_community_size);
        if community.broad_invalidation {
            broad = true;
            break;
        }
        for wallet in &community.wallets {
            cache.invalidate_by_wallet(wallet);
        }
        for nft in &community.nfts {
            cache.invalidate_by_nft(nft);
        }
    }
    if broad {
        cache.invalidate_all();
    }

    let outcome = discover(&view, &config);
    time_bounded.store(outcome.time_bounded, Ordering::Release);
    if outcome.time_bounded {
        warn!(%tenant, "discovery pipeline exhausted its wall-clock budget");
    }

    let current_generation = graph.generation();
    if current_generation != snapshot.generation() {
        debug!(%tenant, snapshot_generation = snapshot.generation(), current_generation, "discarding stale discovery results");
        return;
    }

    let now_ms = current_millis();
    let edges = view.edges();

    let reconciled: Vec<Reconciled> = outcome
        .cycles
        .into_iter()
        .map(|cycle| {
            let candidate = build_candidate(&cycle, &snapshot, &edges, snapshot.generation(), current_generation, now_ms);
            let vector = score(&candidate, config.max_depth);
            let aggregate = vector.aggregate(&config.score_weights);
            Reconciled { cycle, vector, aggregate }
        })
        .collect();

    let scored_loops: Vec<ScoredLoop> = reconciled
        .iter()
        .map(|r| ScoredLoop {
            canonical_id: r.cycle.canonical_id.clone(),
            length: r.cycle.steps.len(),
            aggregate: r.aggregate,
        })
        .collect();
    let ranked = filter_and_rank(scored_loops, config.min_score_threshold);
    let surviving: HashSet<&str> = ranked.iter().map(|s| s.canonical_id.as_str()).collect();

    let mut installed = 0;
    let total_found = reconciled.len();
    for item in &reconciled {
        if !surviving.contains(item.cycle.canonical_id.as_str()) {
            continue;
        }
        let k = item.cycle.steps.len();
        let steps: Vec<CachedStep> = item
            .cycle
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| CachedStep {
                from: step.wallet.clone(),
                to: item.cycle.steps[(i + 1) % k].wallet.clone(),
                nft: step.nft.clone(),
            })
            .collect();
        cache.insert(CachedLoop {
            canonical_id: item.cycle.canonical_id.clone(),
            steps,
            score_vector: item.vector,
            aggregate_score: item.aggregate,
            status: LoopStatus::Pending,
            source_generation: snapshot.generation(),
            created_at_ms: now_ms,
            last_verified_at_ms: now_ms,
        });
        installed += 1;
    }
    trace!(%tenant, found = total_found, installed, "reconciliation pass complete");
}

fn build_candidate(
    cycle: &CandidateCycle,
    snapshot: &GraphSnapshot,
    edges: &[Edge],
    source_generation: u64,
    current_generation: u64,
    now_ms: u64,
) -> LoopCandidate {
    let k = cycle.steps.len();

    let steps: Vec<ScoringStep> = (0..k)
        .map(|i| {
            let step = &cycle.steps[i];
            let to = cycle.steps[(i + 1) % k].wallet.clone();

            let valuation = snapshot.nft(&step.nft).and_then(|n| n.valuation.clone());
            let from_activity_age_ms = snapshot
                .wallet(&step.wallet)
                .map_or(0, |w| now_ms.saturating_sub(w.last_updated_ms));
            let is_specific_want = snapshot.wallet(&to).is_some_and(|w| w.wants_specific(&step.nft));
            let alternative_count = edges.iter().filter(|e| e.to == to && e.nft != step.nft).count();

            ScoringStep {
                from: step.wallet.clone(),
                to,
                nft: step.nft.clone(),
                valuation,
                valuation_age_ms: None,
                is_specific_want,
                alternative_count,
                from_activity_age_ms,
            }
        })
        .collect();

    LoopCandidate {
        steps,
        community_cohesion: 1.0,
        source_generation,
        current_generation,
        preference_hints: HashMap::new(),
        wallet_reliability: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    use barter_core::{NftMetadata, Want};
    use barter_shared::{NftId, WalletId};

    fn three_cycle(handle: &TenantHandle) {
        let graph = handle.graph();
        let e1 = graph.add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, NftMetadata::default(), 0).unwrap();
        let e2 = graph.add_nft(NftId::new("beta"), WalletId::new("b"), None, None, NftMetadata::default(), 0).unwrap();
        let e3 = graph.add_nft(NftId::new("gamma"), WalletId::new("c"), None, None, NftMetadata::default(), 0).unwrap();
        let e4 = graph.add_want(WalletId::new("a"), Want::Specific(NftId::new("beta")), 0).unwrap().unwrap();
        let e5 = graph.add_want(WalletId::new("b"), Want::Specific(NftId::new("gamma")), 0).unwrap().unwrap();
        let e6 = graph.add_want(WalletId::new("c"), Want::Specific(NftId::new("alpha")), 0).unwrap().unwrap();
        for event in [e1, e2, e3, e4, e5, e6] {
            handle.notify(event).unwrap();
        }
    }

    fn wait_for_cache(handle: &TenantHandle, expected_at_least: usize) {
        for _ in 0..200 {
            if handle.cache().len() >= expected_at_least {
                return;
            }
            sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn reconciliation_discovers_and_caches_the_minimal_cycle() {
        let mut config = TenantConfig::default();
        config.min_score_threshold = 0.0;
        let mut handle = TenantHandle::spawn(TenantId::new("t"), config);

        three_cycle(&handle);
        wait_for_cache(&handle, 1);

        assert_eq!(handle.cache().len(), 1);
        handle.shutdown();
    }

    #[test]
    fn status_reflects_backlog_and_generation() {
        let mut handle = TenantHandle::spawn(TenantId::new("t"), TenantConfig::default());
        three_cycle(&handle);
        for _ in 0..200 {
            if handle.status().generation == 6 {
                break;
            }
            sleep(Duration::from_millis(10));
        }
        let status = handle.status();
        assert_eq!(status.generation, 6);
        handle.shutdown();
    }
}
