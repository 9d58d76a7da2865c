//! # Active Loop Cache
//!
//! Holds the current set of scored loops for one tenant, with wallet and
//! NFT secondary indexes kept transactionally in sync with the primary
//! store (§4.8). Guarded by a single `parking_lot::RwLock`, matching the
//! rest of the workspace's per-tenant concurrency discipline (§5).

use std::collections::{BTreeSet, HashMap};

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use tracing::{debug, trace};

use barter_scoring::ScoreVector;
use barter_shared::{Generation, NftId, TenantId, WalletId};

use crate::error::{CacheError, CacheResult};
use crate::events::CacheChangeEvent;
use crate::state::LoopStatus;

/// One step of a cached loop: `from` hands `nft` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CachedStep {
    /// The wallet handing over the NFT.
    pub from: WalletId,
    /// The wallet receiving the NFT.
    pub to: WalletId,
    /// The NFT traded at this step.
    pub nft: NftId,
}

/// A scored trade loop held in the Active Loop Cache.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CachedLoop {
    /// The loop's rotation-invariant canonical identifier.
    pub canonical_id: String,
    /// The loop's ordered steps.
    pub steps: Vec<CachedStep>,
    /// The 18-dimensional score vector.
    pub score_vector: ScoreVector,
    /// The weighted aggregate score in `[0.0, 1.0]`.
    pub aggregate_score: f64,
    /// Current lifecycle status.
    pub status: LoopStatus,
    /// The generation the loop was computed against.
    pub source_generation: Generation,
    /// Milliseconds since the UNIX epoch this loop was first cached.
    pub created_at_ms: u64,
    /// Milliseconds since the UNIX epoch this loop was last reverified.
    pub last_verified_at_ms: u64,
}

impl CachedLoop {
    /// Every wallet participating in this loop.
    #[must_use]
    pub fn participants(&self) -> impl Iterator<Item = &WalletId> {
        self.steps.iter().map(|s| &s.from)
    }

    /// Every NFT traded in this loop.
    #[must_use]
    pub fn nfts(&self) -> impl Iterator<Item = &NftId> {
        self.steps.iter().map(|s| &s.nft)
    }

    /// The loop's length (participant / step count).
    #[must_use]
    pub fn length(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Default)]
struct CacheState {
    loops: HashMap<String, CachedLoop>,
    by_wallet: HashMap<WalletId, BTreeSet<String>>,
    by_nft: HashMap<NftId, BTreeSet<String>>,
}

impl CacheState {
    fn index(&mut self, cached: &CachedLoop) {
        for wallet in cached.participants() {
            self.by_wallet.entry(wallet.clone()).or_default().insert(cached.canonical_id.clone());
        }
        for nft in cached.nfts() {
            self.by_nft.entry(nft.clone()).or_default().insert(cached.canonical_id.clone());
        }
    }

    fn deindex(&mut self, cached: &CachedLoop) {
        for wallet in cached.participants() {
            if let Some(ids) = self.by_wallet.get_mut(wallet) {
                ids.remove(&cached.canonical_id);
                if ids.is_empty() {
                    self.by_wallet.remove(wallet);
                }
            }
        }
        for nft in cached.nfts() {
            if let Some(ids) = self.by_nft.get_mut(nft) {
                ids.remove(&cached.canonical_id);
                if ids.is_empty() {
                    self.by_nft.remove(nft);
                }
            }
        }
    }
}

/// One tenant's Active Loop Cache.
pub struct ActiveLoopCache {
    tenant: TenantId,
    state: RwLock<CacheState>,
    listeners: RwLock<Vec<Sender<CacheChangeEvent>>>,
}

impl ActiveLoopCache {
    /// Builds an empty cache for `tenant`.
    #[must_use]
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            state: RwLock::new(CacheState::default()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Registers a channel to receive [`CacheChangeEvent`]s for every loop
    /// this cache gains or loses from this point on (§6, event
    /// subscription). Delivery to `sender` is best-effort: a full channel
    /// drops the event rather than blocking the mutation that produced it.
    pub fn add_listener(&self, sender: Sender<CacheChangeEvent>) {
        self.listeners.write().push(sender);
    }

    fn publish(&self, event: CacheChangeEvent) {
        let listeners = self.listeners.read();
        if listeners.is_empty() {
            return;
        }
        for listener in listeners.iter() {
            let _ = listener.try_send(event.clone());
        }
    }

    /// Inserts or refreshes `loop_`, keyed by its canonical identifier
    /// (§4.8, idempotent insert). If a loop with the same identifier
    /// already exists, its score and verification timestamp are updated in
    /// place rather than duplicated; its lifecycle `status` is preserved
    /// unless the new record is itself further along (never regressed).
    pub fn insert(&self, loop_: CachedLoop) {
        let mut state = self.state.write();
        let existing = state.loops.get(&loop_.canonical_id).cloned();

        if let Some(existing) = existing {
            if existing.steps == loop_.steps {
                let mut updated = loop_;
                updated.status = existing.status;
                updated.created_at_ms = existing.created_at_ms;
                trace!(tenant = %self.tenant, canonical_id = %updated.canonical_id, "loop refreshed");
                state.loops.insert(updated.canonical_id.clone(), updated);
                return;
            }
            state.deindex(&existing);
        }

        debug!(tenant = %self.tenant, canonical_id = %loop_.canonical_id, "loop inserted");
        state.index(&loop_);
        state.loops.insert(loop_.canonical_id.clone(), loop_.clone());
        drop(state);
        self.publish(CacheChangeEvent::Gained {
            tenant: self.tenant.clone(),
            loop_,
        });
    }

    /// Removes every cached loop referencing `wallet`.
    pub fn invalidate_by_wallet(&self, wallet: &WalletId) -> usize {
        let mut state = self.state.write();
        let Some(ids) = state.by_wallet.get(wallet).cloned() else {
            return 0;
        };
        self.remove_many(&mut state, &ids)
    }

    /// Removes every cached loop referencing `nft`.
    pub fn invalidate_by_nft(&self, nft: &NftId) -> usize {
        let mut state = self.state.write();
        let Some(ids) = state.by_nft.get(nft).cloned() else {
            return 0;
        };
        self.remove_many(&mut state, &ids)
    }

    /// Drops every cached loop, unconditionally (§4.2's broad-invalidation
    /// fallback, when the Delta Detector's affected community exceeds
    /// `max_community_size`).
    pub fn invalidate_all(&self) -> usize {
        let mut state = self.state.write();
        let ids: Vec<String> = state.loops.keys().cloned().collect();
        state.loops.clear();
        state.by_wallet.clear();
        state.by_nft.clear();
        let removed = ids.len();
        if removed > 0 {
            debug!(tenant = %self.tenant, count = removed, "cache fully invalidated");
        }
        for canonical_id in ids {
            self.publish(CacheChangeEvent::Lost {
                tenant: self.tenant.clone(),
                canonical_id,
            });
        }
        removed
    }

    fn remove_many(&self, state: &mut CacheState, ids: &BTreeSet<String>) -> usize {
        let mut removed = 0;
        for id in ids {
            if let Some(cached) = state.loops.remove(id) {
                state.deindex(&cached);
                removed += 1;
                self.publish(CacheChangeEvent::Lost {
                    tenant: self.tenant.clone(),
                    canonical_id: cached.canonical_id,
                });
            }
        }
        if removed > 0 {
            debug!(tenant = %self.tenant, count = removed, "loops invalidated");
        }
        removed
    }

    /// Loops involving `wallet`, ordered by aggregate score descending,
    /// bounded by `max_results`.
    #[must_use]
    pub fn get_by_wallet(&self, wallet: &WalletId, max_results: usize) -> Vec<CachedLoop> {
        let state = self.state.read();
        let Some(ids) = state.by_wallet.get(wallet) else {
            return Vec::new();
        };
        let mut loops: Vec<CachedLoop> = ids.iter().filter_map(|id| state.loops.get(id).cloned()).collect();
        loops.sort_by(|a, b| {
            b.aggregate_score
                .partial_cmp(&a.aggregate_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.length().cmp(&b.length()))
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        loops.truncate(max_results);
        loops
    }

    /// Looks up a loop by canonical identifier.
    #[must_use]
    pub fn get_by_identifier(&self, canonical_id: &str) -> Option<CachedLoop> {
        self.state.read().loops.get(canonical_id).cloned()
    }

    /// Attempts to move the loop identified by `canonical_id` to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownLoop`] if the loop is not cached, or
    /// [`CacheError::InvalidTransition`] if the state machine rejects the
    /// move (§4.8).
    pub fn transition(&self, canonical_id: &str, next: LoopStatus, now_ms: u64) -> CacheResult<()> {
        let mut state = self.state.write();
        let Some(cached) = state.loops.get_mut(canonical_id) else {
            return Err(CacheError::UnknownLoop(canonical_id.to_string()));
        };
        if !cached.status.can_transition_to(next) {
            return Err(CacheError::InvalidTransition {
                from: cached.status,
                to: next,
            });
        }
        cached.status = next;
        cached.last_verified_at_ms = now_ms;
        Ok(())
    }

    /// Drops loops with a terminal status older than `retention_ms`,
    /// measured against `now_ms` (§4.8).
    pub fn compact(&self, now_ms: u64, retention_ms: u64) -> usize {
        let mut state = self.state.write();
        let expired: Vec<String> = state
            .loops
            .values()
            .filter(|cached| {
                cached.status.is_terminal() && now_ms.saturating_sub(cached.last_verified_at_ms) > retention_ms
            })
            .map(|cached| cached.canonical_id.clone())
            .collect();
        let expired: BTreeSet<String> = expired.into_iter().collect();
        self.remove_many(&mut state, &expired)
    }

    /// Every cached loop, in no particular order (persistence snapshots,
    /// §6's `serialize_tenant`).
    #[must_use]
    pub fn all(&self) -> Vec<CachedLoop> {
        self.state.read().loops.values().cloned().collect()
    }

    /// Number of loops currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().loops.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
