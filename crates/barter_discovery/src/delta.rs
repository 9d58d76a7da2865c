//! # Delta Detector
//!
//! Computes the "affected community" around a graph mutation (§4.2): the
//! smallest set of wallets and NFTs whose membership in any cycle could
//! have changed. Bounded by `max_depth` hops and `max_community_size`
//! vertices; exceeding the size bound degrades to a full-graph pass.

use std::collections::{BTreeSet, VecDeque};

use barter_shared::{EventKind, GraphEvent, NftId, WalletId};

use crate::view::UnifiedGraphView;

/// The outcome of running the Delta Detector against one event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AffectedCommunity {
    /// Wallets within the bounded closure.
    pub wallets: BTreeSet<WalletId>,
    /// NFTs within the bounded closure.
    pub nfts: BTreeSet<NftId>,
    /// Set when the closure exceeded `max_community_size` and the detector
    /// degraded to treating the whole graph as affected (§4.2).
    pub broad_invalidation: bool,
}

/// Computes the affected community for `event` against `view`, bounded by
/// `max_depth` edges and capped at `max_community_size` vertices.
#[must_use]
pub fn affected_community(
    event: &GraphEvent,
    view: &UnifiedGraphView<'_>,
    max_depth: usize,
    max_community_size: usize,
) -> AffectedCommunity {
    let mut wallets: BTreeSet<WalletId> = event.referenced_wallets().into_iter().cloned().collect();
    let mut nfts: BTreeSet<NftId> = event.referenced_nft().into_iter().cloned().collect();

    if let EventKind::WantAdded { nft: Some(nft), .. } | EventKind::WantRemoved { nft: Some(nft), .. } =
        &event.kind
    {
        if let Some(owner) = view.owner(nft) {
            wallets.insert(owner.clone());
        }
    }

    let edges = view.edges();
    let mut frontier: VecDeque<(WalletId, usize)> = wallets.iter().cloned().map(|w| (w, 0)).collect();
    let mut visited: BTreeSet<WalletId> = wallets.clone();

    while let Some((wallet, depth)) = frontier.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for edge in &edges {
            let neighbor = if edge.from == wallet {
                Some((&edge.to, &edge.nft))
            } else if edge.to == wallet {
                Some((&edge.from, &edge.nft))
            } else {
                None
            };
            if let Some((other, nft)) = neighbor {
                nfts.insert(nft.clone());
                if visited.insert(other.clone()) {
                    wallets.insert(other.clone());
                    frontier.push_back((other.clone(), depth + 1));
                }
            }
        }

        if wallets.len() > max_community_size {
            return AffectedCommunity {
                wallets: view.vertices(),
                nfts,
                broad_invalidation: true,
            };
        }
    }

    AffectedCommunity {
        wallets,
        nfts,
        broad_invalidation: false,
    }
}
