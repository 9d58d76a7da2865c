//! # Inventory and Want Ingestion
//!
//! `submit_inventory`, `submit_wants`, and `remove_wallet` (§6). Every
//! mutation goes through the tenant's live [`barter_core::graph::TenantGraph`]
//! and the resulting [`barter_shared::GraphEvent`] is handed to the worker via
//! [`barter_concurrency::TenantHandle::notify`] so the Active Loop Cache is
//! reconciled in the background rather than on the caller's thread.

use std::collections::BTreeSet;

use barter_core::{EngineError, EngineResult, NftMetadata, Want};
use barter_shared::{CollectionId, NftId, TenantId, Valuation, WalletId};

use crate::engine::BarterEngine;
use crate::time::current_millis;

/// One NFT submitted as part of a wallet's inventory (§6: "each NFT =
/// `{id, metadata, ownership.ownerId, optional valuation, optional
/// collection, optional platform-data}`").
#[derive(Clone, Debug)]
pub struct NftSubmission {
    /// The NFT's tenant-opaque identifier.
    pub id: NftId,
    /// The NFT's claimed owner. Rejected if it does not match the
    /// submitting wallet.
    pub owner: WalletId,
    /// The collection this NFT belongs to, if known.
    pub collection: Option<CollectionId>,
    /// Current valuation, if known.
    pub valuation: Option<Valuation>,
    /// Engine-interpreted and pass-through metadata.
    pub metadata: NftMetadata,
}

/// Per-NFT outcome of a `submit_inventory` call.
#[derive(Clone, Debug)]
pub struct InventoryAck {
    /// The NFT this acknowledgment is for.
    pub id: NftId,
    /// Whether the NFT was accepted into the graph.
    pub accepted: bool,
    /// Why the NFT was rejected, when `accepted` is `false`.
    pub reason: Option<String>,
}

impl BarterEngine {
    /// Submits a wallet's inventory (§6, `submit_inventory`). Each NFT is
    /// accepted or rejected independently; one bad entry does not fail the
    /// whole batch. An NFT whose `owner` does not match `wallet` is rejected
    /// rather than silently reassigned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if `tenant` does not exist, or
    /// [`EngineError::TenantBusy`] if the worker's mutation channel is
    /// saturated partway through the batch (any NFTs acknowledged before
    /// that point remain accepted).
    pub fn submit_inventory(
        &self,
        tenant: &TenantId,
        wallet: &WalletId,
        nfts: Vec<NftSubmission>,
    ) -> EngineResult<Vec<InventoryAck>> {
        let handle = self.registry.handle(tenant)?;
        let now_ms = current_millis();
        let mut acks = Vec::with_capacity(nfts.len());

        for submission in nfts {
            if &submission.owner != wallet {
                acks.push(InventoryAck {
                    id: submission.id,
                    accepted: false,
                    reason: Some(format!(
                        "owner {} does not match submitting wallet {wallet}",
                        submission.owner
                    )),
                });
                continue;
            }

            if let Some(collection) = &submission.collection {
                if let Err(err) = self
                    .collections
                    .record_membership(submission.id.clone(), collection.clone())
                {
                    acks.push(InventoryAck {
                        id: submission.id,
                        accepted: false,
                        reason: Some(err.to_string()),
                    });
                    continue;
                }
            }
            let resolved_collection = submission
                .collection
                .clone()
                .or_else(|| self.collections.collection_of(&submission.id));

            match handle.graph().add_nft(
                submission.id.clone(),
                submission.owner,
                resolved_collection,
                submission.valuation,
                submission.metadata,
                now_ms,
            ) {
                Ok(event) => {
                    handle.notify(event)?;
                    acks.push(InventoryAck {
                        id: submission.id,
                        accepted: true,
                        reason: None,
                    });
                }
                Err(EngineError::InvalidInput(reason)) => {
                    acks.push(InventoryAck {
                        id: submission.id,
                        accepted: false,
                        reason: Some(reason),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(acks)
    }

    /// Replaces or merges a wallet's wants (§6, `submit_wants`). When `merge`
    /// is `false`, any want the wallet currently holds but that is absent
    /// from `wanted_nft_ids`/`wanted_collection_ids` is removed first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if `tenant` does not exist, or
    /// [`EngineError::TenantBusy`] if the worker's mutation channel is
    /// saturated.
    pub fn submit_wants(
        &self,
        tenant: &TenantId,
        wallet: WalletId,
        wanted_nft_ids: Vec<NftId>,
        wanted_collection_ids: Vec<CollectionId>,
        merge: bool,
    ) -> EngineResult<()> {
        let handle = self.registry.handle(tenant)?;
        let now_ms = current_millis();

        let desired: BTreeSet<Want> = wanted_nft_ids
            .into_iter()
            .map(Want::Specific)
            .chain(wanted_collection_ids.into_iter().map(Want::Collection))
            .collect();

        if !merge {
            let existing: BTreeSet<Want> = handle
                .graph()
                .snapshot()
                .wallet(&wallet)
                .map(|w| w.wants.clone())
                .unwrap_or_default();
            for stale in existing.difference(&desired) {
                if let Some(event) = handle.graph().remove_want(&wallet, stale)? {
                    handle.notify(event)?;
                }
            }
        }

        for want in &desired {
            if let Some(event) = handle.graph().add_want(wallet.clone(), want.clone(), now_ms)? {
                handle.notify(event)?;
            }
        }
        Ok(())
    }

    /// Removes a wallet, cascading through its ownerships and wants (§6,
    /// `remove_wallet`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if `tenant` does not exist, or
    /// [`EngineError::TenantBusy`] if the worker's mutation channel is
    /// saturated partway through the cascade.
    pub fn remove_wallet(&self, tenant: &TenantId, wallet: &WalletId) -> EngineResult<()> {
        let handle = self.registry.handle(tenant)?;
        let events = handle.graph().remove_wallet(wallet)?;
        for event in events {
            handle.notify(event)?;
        }
        Ok(())
    }
}
