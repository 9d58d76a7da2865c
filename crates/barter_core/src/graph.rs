//! # Tenant Graph
//!
//! The living, per-tenant state: wallets, NFTs, and wants, guarded by a
//! single-writer/multi-reader discipline (§4.1, §5). Readers never block a
//! writer and vice versa for longer than a pointer swap: mutations build a
//! new immutable [`GraphState`] and publish it behind an `Arc`, so a
//! [`GraphSnapshot`] taken by a reader answers every subsequent query
//! without touching the lock again.
//!
//! This is a safe alternative to the teacher's lock-free double-buffer
//! (`oroboros_core::sync::double_buffer`): instead of an unsafe atomic index
//! into two preallocated slots, a single `parking_lot::RwLock<Arc<GraphState>>`
//! is swapped under the writer lock. The whole workspace can then honor
//! `#![deny(unsafe_code)]` without exception.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use barter_shared::{CollectionId, EventKind, GraphEvent, Generation, NftId, TenantId, Valuation, WalletId};

use crate::error::{EngineError, EngineResult};
use crate::model::{Nft, NftMetadata, Wallet, Want};

/// The authoritative, cloneable state of one tenant's graph at one instant.
///
/// Cloning is `O(n)` in entity count; it happens once per mutation (not once
/// per read), which is the whole point of the copy-on-write scheme.
#[derive(Clone, Debug, Default)]
struct GraphState {
    wallets: HashMap<WalletId, Wallet>,
    nfts: HashMap<NftId, Nft>,
}

impl GraphState {
    /// Removes `wallet_id` from the map if it owns nothing and wants
    /// nothing, per the destruction rule in §3.
    fn prune_if_empty(&mut self, wallet_id: &WalletId) {
        if self.wallets.get(wallet_id).is_some_and(Wallet::is_empty) {
            self.wallets.remove(wallet_id);
        }
    }
}

/// A read-only, point-in-time view of a tenant's graph (§4.1, `snapshot()`).
///
/// Cheap to hold: it is an `Arc` clone plus a generation stamp. The Unified
/// Graph View is built directly on top of this type.
#[derive(Clone)]
pub struct GraphSnapshot {
    state: Arc<GraphState>,
    generation: Generation,
}

impl GraphSnapshot {
    /// The generation this snapshot was taken at.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The current owner of `nft`, if the NFT exists.
    #[must_use]
    pub fn owner(&self, nft: &NftId) -> Option<&WalletId> {
        self.state.nfts.get(nft).and_then(|n| n.owner.as_ref())
    }

    /// Looks up an NFT by identifier.
    #[must_use]
    pub fn nft(&self, id: &NftId) -> Option<&Nft> {
        self.state.nfts.get(id)
    }

    /// Looks up a wallet by identifier.
    #[must_use]
    pub fn wallet(&self, id: &WalletId) -> Option<&Wallet> {
        self.state.wallets.get(id)
    }

    /// Iterates every wallet in the snapshot.
    pub fn wallets(&self) -> impl Iterator<Item = (&WalletId, &Wallet)> {
        self.state.wallets.iter()
    }

    /// Iterates every NFT in the snapshot.
    pub fn nfts(&self) -> impl Iterator<Item = (&NftId, &Nft)> {
        self.state.nfts.iter()
    }

    /// Every NFT currently belonging to `collection`, owned or not.
    pub fn nfts_in_collection<'a>(&'a self, collection: &'a CollectionId) -> impl Iterator<Item = &'a NftId> + 'a {
        self.state
            .nfts
            .values()
            .filter(move |n| n.collection.as_ref() == Some(collection))
            .map(|n| &n.id)
    }
}

/// One tenant's live, mutable graph.
pub struct TenantGraph {
    tenant: TenantId,
    generation: AtomicU64,
    state: RwLock<Arc<GraphState>>,
}

impl TenantGraph {
    /// Builds an empty graph for `tenant` at generation 0.
    #[must_use]
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            generation: AtomicU64::new(0),
            state: RwLock::new(Arc::new(GraphState::default())),
        }
    }

    /// The tenant this graph belongs to.
    #[must_use]
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// The current generation (§5, incremented by exactly one per mutation).
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    /// Takes a lock-free, immutable snapshot of the graph (§4.1).
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read().clone();
        GraphSnapshot {
            state,
            generation: self.generation(),
        }
    }

    fn bump_generation(&self) -> Generation {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Adds an NFT to the graph, or transfers it if it already exists
    /// (§4.1). If a prior owner existed, their ownership record is removed
    /// as part of the same mutation and the emitted event carries both the
    /// previous and new owner.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `id` or `owner` is empty.
    #[allow(clippy::too_many_arguments)]
    pub fn add_nft(
        &self,
        id: NftId,
        owner: WalletId,
        collection: Option<CollectionId>,
        valuation: Option<Valuation>,
        metadata: NftMetadata,
        now_ms: u64,
    ) -> EngineResult<GraphEvent> {
        if id.is_empty() {
            return Err(EngineError::InvalidInput(
                "nft identifier must not be empty".to_string(),
            ));
        }
        if owner.is_empty() {
            return Err(EngineError::InvalidInput(
                "owner wallet identifier must not be empty".to_string(),
            ));
        }

        let mut guard = self.state.write();
        let mut next = (**guard).clone();

        let previous_owner = next.nfts.get(&id).and_then(|n| n.owner.clone());
        if let Some(previous) = &previous_owner {
            if let Some(wallet) = next.wallets.get_mut(previous) {
                wallet.owned.remove(&id);
            }
            next.prune_if_empty(previous);
        }

        let new_wallet = next
            .wallets
            .entry(owner.clone())
            .or_insert_with(|| Wallet::new(owner.clone(), now_ms));
        new_wallet.owned.insert(id.clone());
        new_wallet.wants.remove(&Want::Specific(id.clone()));
        new_wallet.last_updated_ms = now_ms;

        let nft = next
            .nfts
            .entry(id.clone())
            .or_insert_with(|| Nft::new(id.clone(), owner.clone()));
        nft.owner = Some(owner.clone());
        nft.collection = collection;
        nft.valuation = valuation;
        nft.metadata = metadata;

        *guard = Arc::new(next);
        let generation = self.bump_generation();
        trace!(tenant = %self.tenant, generation, nft = %id, "nft added");

        Ok(GraphEvent::new(
            self.tenant.clone(),
            generation,
            EventKind::NftAdded {
                nft: id,
                previous_owner,
                new_owner: owner,
            },
        ))
    }

    /// Removes an NFT from the graph (§4.1). Want edges pointing at it are
    /// retained so the NFT can satisfy them again if resubmitted.
    ///
    /// Returns `Ok(None)` if the NFT was already absent (no-op success).
    pub fn remove_nft(&self, id: &NftId) -> EngineResult<Option<GraphEvent>> {
        let mut guard = self.state.write();
        let mut next = (**guard).clone();

        let Some(removed) = next.nfts.remove(id) else {
            return Ok(None);
        };
        let Some(previous_owner) = removed.owner else {
            return Ok(None);
        };

        if let Some(wallet) = next.wallets.get_mut(&previous_owner) {
            wallet.owned.remove(id);
        }
        next.prune_if_empty(&previous_owner);

        *guard = Arc::new(next);
        let generation = self.bump_generation();
        debug!(tenant = %self.tenant, generation, nft = %id, "nft removed");

        Ok(Some(GraphEvent::new(
            self.tenant.clone(),
            generation,
            EventKind::NftRemoved {
                nft: id.clone(),
                previous_owner,
            },
        )))
    }

    /// Adds a want for `wallet` (§4.1). Silently rejected (returns
    /// `Ok(None)`, no event) if the wallet already owns the wanted NFT or
    /// already holds this exact want — these are invariant violations the
    /// spec requires to be pruned rather than erred.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `wallet` is empty.
    pub fn add_want(&self, wallet: WalletId, want: Want, now_ms: u64) -> EngineResult<Option<GraphEvent>> {
        if wallet.is_empty() {
            return Err(EngineError::InvalidInput(
                "wallet identifier must not be empty".to_string(),
            ));
        }

        let mut guard = self.state.write();
        let mut next = (**guard).clone();

        if let Want::Specific(nft) = &want {
            if next
                .nfts
                .get(nft)
                .is_some_and(|n| n.owner.as_ref() == Some(&wallet))
            {
                trace!(tenant = %self.tenant, %wallet, "want rejected: wallet owns wanted nft");
                return Ok(None);
            }
        }

        let entry = next
            .wallets
            .entry(wallet.clone())
            .or_insert_with(|| Wallet::new(wallet.clone(), now_ms));
        if !entry.wants.insert(want.clone()) {
            return Ok(None);
        }
        entry.last_updated_ms = now_ms;

        let (nft, collection) = match &want {
            Want::Specific(nft) => (Some(nft.clone()), None),
            Want::Collection(collection) => (None, Some(collection.clone())),
        };

        *guard = Arc::new(next);
        let generation = self.bump_generation();
        trace!(tenant = %self.tenant, generation, %wallet, "want added");

        Ok(Some(GraphEvent::new(
            self.tenant.clone(),
            generation,
            EventKind::WantAdded {
                wallet,
                nft,
                collection,
            },
        )))
    }

    /// Removes a want for `wallet` (§4.1). No-op success if the want was
    /// absent.
    pub fn remove_want(&self, wallet: &WalletId, want: &Want) -> EngineResult<Option<GraphEvent>> {
        let mut guard = self.state.write();
        let mut next = (**guard).clone();

        let Some(entry) = next.wallets.get_mut(wallet) else {
            return Ok(None);
        };
        if !entry.wants.remove(want) {
            return Ok(None);
        }
        next.prune_if_empty(wallet);

        let (nft, collection) = match want {
            Want::Specific(nft) => (Some(nft.clone()), None),
            Want::Collection(collection) => (None, Some(collection.clone())),
        };

        *guard = Arc::new(next);
        let generation = self.bump_generation();
        trace!(tenant = %self.tenant, generation, %wallet, "want removed");

        Ok(Some(GraphEvent::new(
            self.tenant.clone(),
            generation,
            EventKind::WantRemoved {
                wallet: wallet.clone(),
                nft,
                collection,
            },
        )))
    }

    /// Cascades removal of a wallet through its ownerships and wants
    /// (`remove_wallet`, §6). Every owned NFT is removed (not transferred)
    /// and every want is dropped; returns the events produced, in the order
    /// applied.
    pub fn remove_wallet(&self, wallet: &WalletId) -> EngineResult<Vec<GraphEvent>> {
        let owned: Vec<NftId> = {
            let guard = self.state.read();
            guard
                .wallets
                .get(wallet)
                .map(|w| w.owned.iter().cloned().collect())
                .unwrap_or_default()
        };

        let mut events = Vec::new();
        for nft in owned {
            if let Some(event) = self.remove_nft(&nft)? {
                events.push(event);
            }
        }

        let wants: Vec<Want> = {
            let guard = self.state.read();
            guard
                .wallets
                .get(wallet)
                .map(|w| w.wants.iter().cloned().collect())
                .unwrap_or_default()
        };
        for want in wants {
            if let Some(event) = self.remove_want(wallet, &want)? {
                events.push(event);
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nft_metadata() -> NftMetadata {
        NftMetadata::default()
    }

    #[test]
    fn add_nft_rejects_empty_identifier() {
        let graph = TenantGraph::new(TenantId::new("t"));
        let result = graph.add_nft(
            NftId::new(""),
            WalletId::new("a"),
            None,
            None,
            nft_metadata(),
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn add_nft_transfers_ownership_and_advances_generation() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, nft_metadata(), 0)
            .unwrap();
        assert_eq!(graph.generation(), 1);

        let event = graph
            .add_nft(NftId::new("alpha"), WalletId::new("b"), None, None, nft_metadata(), 1)
            .unwrap();
        assert_eq!(graph.generation(), 2);
        match event.kind {
            EventKind::NftAdded { previous_owner, .. } => {
                assert_eq!(previous_owner, Some(WalletId::new("a")));
            }
            _ => panic!("expected NftAdded"),
        }

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.owner(&NftId::new("alpha")), Some(&WalletId::new("b")));
        assert!(snapshot.wallet(&WalletId::new("a")).is_none());
    }

    #[test]
    fn remove_nft_is_noop_when_unknown() {
        let graph = TenantGraph::new(TenantId::new("t"));
        let result = graph.remove_nft(&NftId::new("ghost")).unwrap();
        assert!(result.is_none());
        assert_eq!(graph.generation(), 0);
    }

    #[test]
    fn remove_nft_retains_wants() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, nft_metadata(), 0)
            .unwrap();
        graph
            .add_want(WalletId::new("b"), Want::Specific(NftId::new("alpha")), 0)
            .unwrap();

        graph.remove_nft(&NftId::new("alpha")).unwrap();

        let snapshot = graph.snapshot();
        let wallet = snapshot.wallet(&WalletId::new("b")).unwrap();
        assert!(wallet.wants_specific(&NftId::new("alpha")));
    }

    #[test]
    fn add_want_rejects_wanting_owned_nft() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, nft_metadata(), 0)
            .unwrap();
        let result = graph
            .add_want(WalletId::new("a"), Want::Specific(NftId::new("alpha")), 0)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(graph.generation(), 1);
    }

    #[test]
    fn add_want_is_idempotent() {
        let graph = TenantGraph::new(TenantId::new("t"));
        let first = graph
            .add_want(WalletId::new("a"), Want::Specific(NftId::new("alpha")), 0)
            .unwrap();
        assert!(first.is_some());
        let second = graph
            .add_want(WalletId::new("a"), Want::Specific(NftId::new("alpha")), 1)
            .unwrap();
        assert!(second.is_none());
        assert_eq!(graph.generation(), 1);
    }

    #[test]
    fn remove_want_prunes_empty_wallet() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_want(WalletId::new("a"), Want::Specific(NftId::new("alpha")), 0)
            .unwrap();
        graph
            .remove_want(&WalletId::new("a"), &Want::Specific(NftId::new("alpha")))
            .unwrap();

        let snapshot = graph.snapshot();
        assert!(snapshot.wallet(&WalletId::new("a")).is_none());
    }

    #[test]
    fn remove_wallet_cascades_ownership_and_wants() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, nft_metadata(), 0)
            .unwrap();
        graph
            .add_want(WalletId::new("a"), Want::Specific(NftId::new("beta")), 0)
            .unwrap();

        let events = graph.remove_wallet(&WalletId::new("a")).unwrap();
        assert_eq!(events.len(), 2);

        let snapshot = graph.snapshot();
        assert!(snapshot.wallet(&WalletId::new("a")).is_none());
        assert!(snapshot.nft(&NftId::new("alpha")).is_none());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutations() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, nft_metadata(), 0)
            .unwrap();
        let snapshot = graph.snapshot();
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("b"), None, None, nft_metadata(), 1)
            .unwrap();

        assert_eq!(snapshot.owner(&NftId::new("alpha")), Some(&WalletId::new("a")));
        assert_eq!(graph.snapshot().owner(&NftId::new("alpha")), Some(&WalletId::new("b")));
    }
}
