//! # Graph Change Events
//!
//! Every mutation to a `TenantGraph` emits one of these. They are the unit
//! of work the Delta Detector consumes and the payload delivered to
//! subscribers of the Active Loop Cache (loop-level events, not these raw
//! graph events, reach external subscribers — see `barter::subscription`).

use crate::ids::{CollectionId, NftId, TenantId, WalletId};

/// Monotonic per-tenant counter. Every mutation increments it by exactly one.
///
/// A discovery task computed against generation `g` may only install its
/// results if the tenant is still at generation `g`; otherwise the task's
/// output is stale and must be discarded (§5, "Generation numbers").
pub type Generation = u64;

/// The kind of mutation that produced a [`GraphEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// An NFT was added or transferred to a new owner.
    NftAdded {
        /// The NFT that changed hands.
        nft: NftId,
        /// The previous owner, if any (an implicit removal precedes this).
        previous_owner: Option<WalletId>,
        /// The new owner.
        new_owner: WalletId,
    },
    /// An NFT was removed from the graph. Want edges pointing at it are
    /// retained (§4.1) so they can be satisfied again if it reappears.
    NftRemoved {
        /// The NFT that was removed.
        nft: NftId,
        /// The owner it was removed from.
        previous_owner: WalletId,
    },
    /// A wallet started wanting a specific NFT or an entire collection.
    WantAdded {
        /// The wanting wallet.
        wallet: WalletId,
        /// The NFT wanted, if this is a specific want.
        nft: Option<NftId>,
        /// The collection wanted, if this is a collection want.
        collection: Option<CollectionId>,
    },
    /// A wallet stopped wanting a specific NFT or an entire collection.
    WantRemoved {
        /// The wallet whose want was removed.
        wallet: WalletId,
        /// The NFT no longer wanted, if this was a specific want.
        nft: Option<NftId>,
        /// The collection no longer wanted, if this was a collection want.
        collection: Option<CollectionId>,
    },
}

/// A single change emitted by a `TenantGraph` mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEvent {
    /// The tenant the mutation occurred in.
    pub tenant: TenantId,
    /// The generation this event produced (post-mutation value).
    pub generation: Generation,
    /// What changed.
    pub kind: EventKind,
}

impl GraphEvent {
    /// Builds a new graph event.
    #[must_use]
    pub fn new(tenant: TenantId, generation: Generation, kind: EventKind) -> Self {
        Self {
            tenant,
            generation,
            kind,
        }
    }

    /// Returns every wallet identifier directly referenced by this event.
    #[must_use]
    pub fn referenced_wallets(&self) -> Vec<&WalletId> {
        match &self.kind {
            EventKind::NftAdded {
                previous_owner,
                new_owner,
                ..
            } => {
                let mut wallets = vec![new_owner];
                if let Some(prev) = previous_owner {
                    wallets.push(prev);
                }
                wallets
            }
            EventKind::NftRemoved { previous_owner, .. } => vec![previous_owner],
            EventKind::WantAdded { wallet, .. } | EventKind::WantRemoved { wallet, .. } => {
                vec![wallet]
            }
        }
    }

    /// Returns the NFT identifier directly referenced by this event, if any.
    #[must_use]
    pub fn referenced_nft(&self) -> Option<&NftId> {
        match &self.kind {
            EventKind::NftAdded { nft, .. } | EventKind::NftRemoved { nft, .. } => Some(nft),
            EventKind::WantAdded { nft, .. } | EventKind::WantRemoved { nft, .. } => nft.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nft_added_references_both_owners() {
        let event = GraphEvent::new(
            TenantId::new("t"),
            1,
            EventKind::NftAdded {
                nft: NftId::new("n"),
                previous_owner: Some(WalletId::new("old")),
                new_owner: WalletId::new("new"),
            },
        );
        let wallets = event.referenced_wallets();
        assert_eq!(wallets.len(), 2);
    }
}
