//! # Data Model
//!
//! Wallets, NFTs, and wants (§3). These are plain value types; the
//! `TenantGraph` in [`crate::graph`] owns the collections of them and
//! enforces the invariants (exactly-one-owner, no self-wants).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use barter_shared::{CollectionId, NftId, Valuation, WalletId};

/// Opaque, pass-through metadata. The engine never interprets these bytes;
/// typed accessors exist only for fields it actually uses (name, for
/// diagnostics).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformData(pub Vec<u8>);

/// An NFT's engine-interpreted metadata plus an opaque pass-through blob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    /// Human-readable name, if supplied.
    pub name: Option<String>,
    /// Image URL, if supplied.
    pub image_url: Option<String>,
    /// Opaque per-platform data returned verbatim on queries.
    pub platform_data: PlatformData,
}

/// An NFT within one tenant's graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    /// The NFT's tenant-opaque identifier.
    pub id: NftId,
    /// Current owner. `None` only transiently during an atomic ownership
    /// move within a single event (§3); never observable between events.
    pub owner: Option<WalletId>,
    /// The collection this NFT belongs to, if any.
    pub collection: Option<CollectionId>,
    /// Current valuation, if known.
    pub valuation: Option<Valuation>,
    /// Engine-interpreted and pass-through metadata.
    pub metadata: NftMetadata,
}

impl Nft {
    /// Builds a new NFT owned by `owner`.
    #[must_use]
    pub fn new(id: NftId, owner: WalletId) -> Self {
        Self {
            id,
            owner: Some(owner),
            collection: None,
            valuation: None,
            metadata: NftMetadata::default(),
        }
    }
}

/// A want expressed by a wallet: either a specific NFT or an entire
/// collection (§3). `Collection` wants are expanded lazily by the Unified
/// Graph View, never eagerly materialized as per-NFT edges.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Want {
    /// Wants one specific NFT.
    Specific(NftId),
    /// Wants any NFT currently in this collection.
    Collection(CollectionId),
}

/// A wallet within one tenant's graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Wallet {
    /// The wallet's tenant-opaque identifier.
    pub id: Option<WalletId>,
    /// NFTs currently owned by this wallet.
    pub owned: BTreeSet<NftId>,
    /// Active wants, specific and collection alike.
    pub wants: BTreeSet<Want>,
    /// Milliseconds since the UNIX epoch of the wallet's last mutation
    /// (ownership or want change), used by the Scorer's liveness family.
    pub last_updated_ms: u64,
}

impl Wallet {
    /// Builds an empty wallet with no owned NFTs or wants.
    #[must_use]
    pub fn new(id: WalletId, now_ms: u64) -> Self {
        Self {
            id: Some(id),
            owned: BTreeSet::new(),
            wants: BTreeSet::new(),
            last_updated_ms: now_ms,
        }
    }

    /// A wallet is eligible for destruction once it owns nothing and wants
    /// nothing (§3).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owned.is_empty() && self.wants.is_empty()
    }

    /// Whether this wallet wants a specific NFT, directly (not via a
    /// collection want — collection resolution is the Unified Graph View's
    /// job, not the raw data model's).
    #[must_use]
    pub fn wants_specific(&self, nft: &NftId) -> bool {
        self.wants.contains(&Want::Specific(nft.clone()))
    }
}
