//! # Snapshot Format
//!
//! A versioned, checksummed byte format for one tenant's state (§6's
//! persistence contract): magic bytes, a version, the generation the
//! snapshot was taken at, and a CRC32-protected JSON payload. Mirrors the
//! teacher's WAL header (`oroboros_economy::wal`: magic `b"OWAL"` + version +
//! LSN, each record's payload independently checksummed) without the log
//! structure — a tenant snapshot is one record, not a stream of them.
//!
//! ```text
//! [4 bytes: magic "BARS"]
//! [4 bytes: format version, little-endian]
//! [8 bytes: source generation, little-endian]
//! [4 bytes: payload length, little-endian]
//! [N bytes: payload (JSON)]
//! [4 bytes: CRC32 of (generation || payload length || payload)]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use barter_cache::{ActiveLoopCache, CachedLoop};
use barter_core::model::{Nft, Wallet};
use barter_core::{EngineResult, TenantGraph};
use barter_shared::{Generation, TenantId, WalletId};

use crate::error::{PersistenceError, PersistenceResult};

const SNAPSHOT_MAGIC: &[u8; 4] = b"BARS";

/// Current snapshot format version. Bump on any incompatible payload
/// change; [`restore_tenant`] refuses anything newer than this.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotPayload {
    wallets: Vec<Wallet>,
    nfts: Vec<Nft>,
    cached_loops: Vec<CachedLoop>,
}

/// Builds the bytes that checksum-protect the payload: everything in the
/// header after the magic and version, plus the payload itself. Mirrors the
/// teacher's per-record CRC scope (lsn + type + length + payload), adapted
/// to a single-record snapshot.
fn crc_input(generation: Generation, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + 4 + payload.len());
    buf.extend_from_slice(&generation.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Serializes `graph` and `cache` into the versioned snapshot format (§6,
/// `serialize_tenant`).
///
/// # Errors
///
/// Returns [`PersistenceError::Decode`] if the JSON encoder fails, which
/// should not happen for these value types.
pub fn serialize_tenant(graph: &TenantGraph, cache: &ActiveLoopCache) -> PersistenceResult<Vec<u8>> {
    let snapshot = graph.snapshot();

    let payload = SnapshotPayload {
        wallets: snapshot.wallets().map(|(_, w)| w.clone()).collect(),
        nfts: snapshot.nfts().map(|(_, n)| n.clone()).collect(),
        cached_loops: cache.all(),
    };

    let encoded = serde_json::to_vec(&payload).map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let generation = snapshot.generation();
    let crc = crc32fast::hash(&crc_input(generation, &encoded));

    let mut out = Vec::with_capacity(20 + encoded.len());
    out.extend_from_slice(SNAPSHOT_MAGIC);
    out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    out.extend_from_slice(&generation.to_le_bytes());
    out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    out.extend_from_slice(&encoded);
    out.extend_from_slice(&crc.to_le_bytes());

    tracing::debug!(
        tenant = %graph.tenant(),
        generation,
        bytes = out.len(),
        "tenant serialized"
    );
    Ok(out)
}

/// A freshly restored tenant: a live graph and a cache pre-populated with
/// the loops that were active at serialization time, so the engine can
/// resume answering `lookup` queries without waiting for the first
/// reconciliation pass.
pub struct RestoredTenant {
    /// The rebuilt graph, replayed from the snapshot's wallets and NFTs.
    pub graph: TenantGraph,
    /// The rebuilt cache, pre-populated with every loop the snapshot held.
    pub cache: ActiveLoopCache,
}

/// Restores a tenant from a byte snapshot produced by [`serialize_tenant`]
/// (§6, `restore_tenant`).
///
/// # Errors
///
/// Returns [`PersistenceError::BadMagic`] if the header is not a tenant
/// snapshot, [`PersistenceError::IncompatibleVersion`] if it was written by
/// a newer format than this build understands, [`PersistenceError::Truncated`]
/// if the byte stream is shorter than the header claims, [`PersistenceError::Corrupt`]
/// on a CRC mismatch, and [`PersistenceError::Decode`] or
/// [`PersistenceError::Replay`] if the payload cannot be turned back into a
/// graph.
pub fn restore_tenant(tenant: TenantId, bytes: &[u8]) -> PersistenceResult<RestoredTenant> {
    if bytes.len() < 20 {
        return Err(PersistenceError::Truncated(
            "shorter than the fixed header".to_string(),
        ));
    }

    let (magic, rest) = bytes.split_at(4);
    if magic != SNAPSHOT_MAGIC {
        return Err(PersistenceError::BadMagic);
    }

    let (version_bytes, rest) = rest.split_at(4);
    let version = u32::from_le_bytes(version_bytes.try_into().expect("4 bytes"));
    if version > SNAPSHOT_VERSION {
        return Err(PersistenceError::IncompatibleVersion {
            found: version,
            max_supported: SNAPSHOT_VERSION,
        });
    }

    let (generation_bytes, rest) = rest.split_at(8);
    let generation = u64::from_le_bytes(generation_bytes.try_into().expect("8 bytes"));

    let (len_bytes, rest) = rest.split_at(4);
    let payload_len = u32::from_le_bytes(len_bytes.try_into().expect("4 bytes")) as usize;

    if rest.len() < payload_len + 4 {
        return Err(PersistenceError::Truncated(
            "payload shorter than declared length".to_string(),
        ));
    }
    let (payload, rest) = rest.split_at(payload_len);
    let (crc_bytes, _) = rest.split_at(4);
    let stored_crc = u32::from_le_bytes(crc_bytes.try_into().expect("4 bytes"));

    let computed_crc = crc32fast::hash(&crc_input(generation, payload));
    if stored_crc != computed_crc {
        return Err(PersistenceError::Corrupt);
    }

    let decoded: SnapshotPayload =
        serde_json::from_slice(payload).map_err(|e| PersistenceError::Decode(e.to_string()))?;

    let graph = replay(tenant.clone(), &decoded).map_err(|e| PersistenceError::Replay(e.to_string()))?;

    let cache = ActiveLoopCache::new(tenant);
    for cached in decoded.cached_loops {
        cache.insert(cached);
    }

    tracing::info!(
        tenant = %graph.tenant(),
        source_generation = generation,
        restored_generation = graph.generation(),
        wallets = decoded.wallets.len(),
        nfts = decoded.nfts.len(),
        "tenant restored"
    );

    Ok(RestoredTenant { graph, cache })
}

/// Replays a decoded payload's wallets and NFTs into a fresh graph.
///
/// The rebuilt graph's own generation counter starts from zero and advances
/// once per replayed mutation; it will not numerically match the
/// generation the snapshot was taken at. That is fine: generation
/// comparisons are always made against a single graph instance's own
/// history (§5), never against a value persisted elsewhere.
fn replay(tenant: TenantId, payload: &SnapshotPayload) -> EngineResult<TenantGraph> {
    let graph = TenantGraph::new(tenant);

    let mut last_updated: HashMap<WalletId, u64> = HashMap::new();
    for wallet in &payload.wallets {
        if let Some(id) = &wallet.id {
            last_updated.insert(id.clone(), wallet.last_updated_ms);
        }
    }

    for nft in &payload.nfts {
        let Some(owner) = nft.owner.clone() else {
            continue;
        };
        let now_ms = last_updated.get(&owner).copied().unwrap_or(0);
        graph.add_nft(
            nft.id.clone(),
            owner,
            nft.collection.clone(),
            nft.valuation.clone(),
            nft.metadata.clone(),
            now_ms,
        )?;
    }

    for wallet in &payload.wallets {
        let Some(id) = &wallet.id else { continue };
        let now_ms = last_updated.get(id).copied().unwrap_or(0);
        for want in &wallet.wants {
            graph.add_want(id.clone(), want.clone(), now_ms)?;
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::model::{NftMetadata, Want};
    use barter_shared::{NftId, Valuation, FixedPoint};

    fn build_sample() -> (TenantGraph, ActiveLoopCache) {
        let graph = TenantGraph::new(TenantId::new("t1"));
        graph
            .add_nft(
                NftId::new("alpha"),
                WalletId::new("a"),
                None,
                Some(Valuation::new(FixedPoint::from_whole(5), "ETH")),
                NftMetadata::default(),
                1_000,
            )
            .unwrap();
        graph
            .add_want(WalletId::new("b"), Want::Specific(NftId::new("alpha")), 2_000)
            .unwrap();

        let cache = ActiveLoopCache::new(TenantId::new("t1"));
        (graph, cache)
    }

    #[test]
    fn roundtrip_preserves_wallets_and_nfts() {
        let (graph, cache) = build_sample();
        let bytes = serialize_tenant(&graph, &cache).unwrap();

        let restored = restore_tenant(TenantId::new("t1"), &bytes).unwrap();
        let snapshot = restored.graph.snapshot();

        assert_eq!(snapshot.owner(&NftId::new("alpha")), Some(&WalletId::new("a")));
        assert!(snapshot.wallet(&WalletId::new("b")).unwrap().wants_specific(&NftId::new("alpha")));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let (graph, cache) = build_sample();
        let mut bytes = serialize_tenant(&graph, &cache).unwrap();
        bytes[0] = b'X';
        let result = restore_tenant(TenantId::new("t1"), &bytes);
        assert!(matches!(result, Err(PersistenceError::BadMagic)));
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let (graph, cache) = build_sample();
        let mut bytes = serialize_tenant(&graph, &cache).unwrap();
        let last = bytes.len() - 5;
        bytes[last] ^= 0xFF;
        let result = restore_tenant(TenantId::new("t1"), &bytes);
        assert!(matches!(result, Err(PersistenceError::Corrupt)));
    }

    #[test]
    fn future_version_is_refused() {
        let (graph, cache) = build_sample();
        let mut bytes = serialize_tenant(&graph, &cache).unwrap();
        bytes[4..8].copy_from_slice(&(SNAPSHOT_VERSION + 1).to_le_bytes());
        let result = restore_tenant(TenantId::new("t1"), &bytes);
        assert!(matches!(result, Err(PersistenceError::IncompatibleVersion { .. })));
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let (graph, cache) = build_sample();
        let bytes = serialize_tenant(&graph, &cache).unwrap();
        let result = restore_tenant(TenantId::new("t1"), &bytes[..10]);
        assert!(matches!(result, Err(PersistenceError::Truncated(_))));
    }

    #[test]
    fn cached_loops_are_restored() {
        use barter_cache::{CachedLoop, CachedStep, LoopStatus};
        use barter_scoring::ScoreVector;

        let (graph, cache) = build_sample();
        cache.insert(CachedLoop {
            canonical_id: "cid:xyz".to_string(),
            steps: vec![CachedStep {
                from: WalletId::new("a"),
                to: WalletId::new("b"),
                nft: NftId::new("alpha"),
            }],
            score_vector: ScoreVector([0.5; 18]),
            aggregate_score: 0.5,
            status: LoopStatus::Pending,
            source_generation: graph.generation(),
            created_at_ms: 0,
            last_verified_at_ms: 0,
        });

        let bytes = serialize_tenant(&graph, &cache).unwrap();
        let restored = restore_tenant(TenantId::new("t1"), &bytes).unwrap();
        assert_eq!(restored.cache.len(), 1);
        assert!(restored.cache.get_by_identifier("cid:xyz").is_some());
    }
}
