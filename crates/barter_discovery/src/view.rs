//! # Unified Graph View
//!
//! A read-only projection of a [`GraphSnapshot`] that presents wallets and
//! NFTs as a plain directed multigraph to the algorithms downstream (§4.3).
//! An edge `(owner -> wanter, nft)` exists whenever `owner` currently holds
//! `nft` and `wanter` wants it, specifically or via the NFT's collection.
//! Collection resolution reads the collection id the Tenant Graph already
//! recorded on the NFT at ingestion time (populated by the facade from the
//! Collection Resolver); this view does not call the resolver itself, so it
//! stays a pure function of one snapshot.

use std::collections::BTreeSet;

use barter_core::{GraphSnapshot, Want};
use barter_shared::{NftId, WalletId};

/// One candidate trade step: `from` owns `nft` and `to` wants it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    /// The wallet handing over the NFT.
    pub from: WalletId,
    /// The wallet receiving the NFT.
    pub to: WalletId,
    /// The NFT changing hands.
    pub nft: NftId,
}

/// Read-only adapter over a [`GraphSnapshot`] (§4.3).
pub struct UnifiedGraphView<'a> {
    snapshot: &'a GraphSnapshot,
    collection_wants_enabled: bool,
}

impl<'a> UnifiedGraphView<'a> {
    /// Builds a view over `snapshot`. When `collection_wants_enabled` is
    /// false, `wanters` only considers specific wants, matching §4.3's
    /// "short-circuit" behavior for disabled tenants.
    #[must_use]
    pub fn new(snapshot: &'a GraphSnapshot, collection_wants_enabled: bool) -> Self {
        Self {
            snapshot,
            collection_wants_enabled,
        }
    }

    /// The current owner of `nft`, if it exists.
    #[must_use]
    pub fn owner(&self, nft: &NftId) -> Option<&WalletId> {
        self.snapshot.owner(nft)
    }

    /// Every wallet that wants `nft`, specifically or through its collection.
    #[must_use]
    pub fn wanters(&self, nft: &NftId) -> BTreeSet<WalletId> {
        let mut wanters = BTreeSet::new();
        let Some(entry) = self.snapshot.nft(nft) else {
            return wanters;
        };

        for (wallet_id, wallet) in self.snapshot.wallets() {
            if wallet.wants_specific(nft) {
                wanters.insert(wallet_id.clone());
                continue;
            }
            if !self.collection_wants_enabled {
                continue;
            }
            if let Some(collection) = &entry.collection {
                if wallet.wants.contains(&Want::Collection(collection.clone())) {
                    wanters.insert(wallet_id.clone());
                }
            }
        }
        wanters
    }

    /// Every candidate trade step in the graph: one edge per
    /// `(from-wallet, to-wallet, nft)` triple (§4.5, "edge multiplicity").
    #[must_use]
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (nft_id, nft) in self.snapshot.nfts() {
            let Some(owner) = &nft.owner else { continue };
            for wanter in self.wanters(nft_id) {
                if &wanter == owner {
                    continue;
                }
                edges.push(Edge {
                    from: owner.clone(),
                    to: wanter,
                    nft: nft_id.clone(),
                });
            }
        }
        edges.sort();
        edges
    }

    /// Every wallet known to the snapshot, owning or wanting something.
    #[must_use]
    pub fn vertices(&self) -> BTreeSet<WalletId> {
        self.snapshot.wallets().map(|(id, _)| id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::{NftMetadata, TenantGraph};
    use barter_shared::{CollectionId, TenantId};

    fn three_cycle_graph() -> TenantGraph {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, NftMetadata::default(), 0)
            .unwrap();
        graph
            .add_nft(NftId::new("beta"), WalletId::new("b"), None, None, NftMetadata::default(), 0)
            .unwrap();
        graph
            .add_nft(NftId::new("gamma"), WalletId::new("c"), None, None, NftMetadata::default(), 0)
            .unwrap();
        graph.add_want(WalletId::new("a"), Want::Specific(NftId::new("beta")), 0).unwrap();
        graph.add_want(WalletId::new("b"), Want::Specific(NftId::new("gamma")), 0).unwrap();
        graph.add_want(WalletId::new("c"), Want::Specific(NftId::new("alpha")), 0).unwrap();
        graph
    }

    #[test]
    fn wanters_finds_specific_want() {
        let graph = three_cycle_graph();
        let snapshot = graph.snapshot();
        let view = UnifiedGraphView::new(&snapshot, true);
        let wanters = view.wanters(&NftId::new("beta"));
        assert!(wanters.contains(&WalletId::new("a")));
    }

    #[test]
    fn edges_form_a_three_cycle() {
        let graph = three_cycle_graph();
        let snapshot = graph.snapshot();
        let view = UnifiedGraphView::new(&snapshot, true);
        let edges = view.edges();
        assert_eq!(edges.len(), 3);
        assert!(edges.contains(&Edge {
            from: WalletId::new("a"),
            to: WalletId::new("c"),
            nft: NftId::new("alpha"),
        }));
    }

    #[test]
    fn collection_want_resolves_when_enabled_and_is_ignored_when_disabled() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph
            .add_nft(
                NftId::new("alpha"),
                WalletId::new("a"),
                Some(CollectionId::new("apes")),
                None,
                NftMetadata::default(),
                0,
            )
            .unwrap();
        graph
            .add_want(WalletId::new("b"), Want::Collection(CollectionId::new("apes")), 0)
            .unwrap();
        let snapshot = graph.snapshot();

        let enabled = UnifiedGraphView::new(&snapshot, true);
        assert!(enabled.wanters(&NftId::new("alpha")).contains(&WalletId::new("b")));

        let disabled = UnifiedGraphView::new(&snapshot, false);
        assert!(disabled.wanters(&NftId::new("alpha")).is_empty());
    }
}
