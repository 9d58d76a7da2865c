//! # Discovery Queries
//!
//! `discover` and `lookup` (§6), reading from a tenant's Active Loop Cache
//! rather than invoking the discovery pipeline synchronously: the cache is
//! kept warm in the background by the tenant's worker (§5), so a query never
//! blocks on cycle enumeration.

use barter_cache::CachedLoop;
use barter_core::EngineResult;
use barter_shared::{TenantId, WalletId};

use crate::engine::BarterEngine;

/// Caller-supplied bounds for a `discover` call (§6: "maxResults, maxDepth
/// (≤ tenant config), minScore"). Every field only ever tightens the
/// tenant's own configured bound, never loosens past it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscoverSettings {
    /// Caps the number of loops returned. `None` defers to the tenant's
    /// `max_results_per_query`.
    pub max_results: Option<usize>,
    /// Caps loop length. `None` defers to the tenant's `max_depth`.
    pub max_depth: Option<usize>,
    /// Raises the minimum aggregate score a loop must clear. `None` defers
    /// to the tenant's `min_score_threshold`.
    pub min_score: Option<f64>,
}

/// The result of a `discover` call.
#[derive(Clone, Debug)]
pub struct DiscoverResult {
    /// Matching loops, ranked by aggregate score descending.
    pub loops: Vec<CachedLoop>,
    /// Whether the tenant's most recent reconciliation pass exhausted its
    /// wall-clock budget (§7, `Timeout`): not an error, but the cache this
    /// query read from may be missing loops a full pass would have found.
    pub time_bounded: bool,
}

impl BarterEngine {
    /// Discovers trade loops for a tenant (§6, `discover`). If `wallet` is
    /// given, returns loops involving that wallet; otherwise the tenant's
    /// top-N loops overall.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if `tenant` does not exist.
    pub fn discover(
        &self,
        tenant: &TenantId,
        wallet: Option<&WalletId>,
        settings: DiscoverSettings,
    ) -> EngineResult<DiscoverResult> {
        let handle = self.registry.handle(tenant)?;
        let config = handle.config();

        let max_results = settings.max_results.unwrap_or(config.max_results_per_query).min(config.max_results_per_query);
        let max_depth = settings.max_depth.unwrap_or(config.max_depth).min(config.max_depth);
        let min_score = settings.min_score.unwrap_or(config.min_score_threshold).max(config.min_score_threshold);

        let mut loops = match wallet {
            Some(wallet) => handle.cache().get_by_wallet(wallet, usize::MAX),
            None => handle.cache().all(),
        };

        loops.retain(|l| l.length() <= max_depth && l.aggregate_score >= min_score);
        loops.sort_by(|a, b| {
            b.aggregate_score
                .partial_cmp(&a.aggregate_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.length().cmp(&b.length()))
                .then_with(|| a.canonical_id.cmp(&b.canonical_id))
        });
        loops.truncate(max_results);

        Ok(DiscoverResult {
            loops,
            time_bounded: handle.time_bounded(),
        })
    }

    /// Looks up a single loop by its canonical identifier (§6, `lookup`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TenantUnknown`] if `tenant` does not exist.
    pub fn lookup(&self, tenant: &TenantId, canonical_id: &str) -> EngineResult<Option<CachedLoop>> {
        let handle = self.registry.handle(tenant)?;
        Ok(handle.cache().get_by_identifier(canonical_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_cache::{CachedLoop, CachedStep, LoopStatus};
    use barter_collection::ResolverConfig;
    use barter_core::TenantConfig;
    use barter_scoring::ScoreVector;
    use barter_shared::NftId;

    fn sample_loop(id: &str, score: f64) -> CachedLoop {
        CachedLoop {
            canonical_id: id.to_string(),
            steps: vec![
                CachedStep { from: WalletId::new("a"), to: WalletId::new("b"), nft: NftId::new("alpha") },
                CachedStep { from: WalletId::new("b"), to: WalletId::new("a"), nft: NftId::new("beta") },
            ],
            score_vector: ScoreVector([score; 18]),
            aggregate_score: score,
            status: LoopStatus::Pending,
            source_generation: 0,
            created_at_ms: 0,
            last_verified_at_ms: 0,
        }
    }

    #[test]
    fn discover_filters_by_min_score_and_ranks_descending() {
        let engine = BarterEngine::new(ResolverConfig::default());
        engine.create_tenant(TenantId::new("t"), TenantConfig::default()).unwrap();
        let handle = engine.registry.handle(&TenantId::new("t")).unwrap();
        handle.cache().insert(sample_loop("cid:low", 0.1));
        handle.cache().insert(sample_loop("cid:high", 0.9));

        let result = engine
            .discover(
                &TenantId::new("t"),
                None,
                DiscoverSettings {
                    min_score: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(result.loops.len(), 1);
        assert_eq!(result.loops[0].canonical_id, "cid:high");
    }

    #[test]
    fn discover_caller_settings_cannot_loosen_tenant_bound() {
        let engine = BarterEngine::new(ResolverConfig::default());
        let mut config = TenantConfig::default();
        config.min_score_threshold = 0.5;
        engine.create_tenant(TenantId::new("t"), config).unwrap();
        let handle = engine.registry.handle(&TenantId::new("t")).unwrap();
        handle.cache().insert(sample_loop("cid:low", 0.2));

        let result = engine
            .discover(
                &TenantId::new("t"),
                None,
                DiscoverSettings {
                    min_score: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(result.loops.is_empty());
    }

    #[test]
    fn lookup_finds_inserted_loop() {
        let engine = BarterEngine::new(ResolverConfig::default());
        engine.create_tenant(TenantId::new("t"), TenantConfig::default()).unwrap();
        let handle = engine.registry.handle(&TenantId::new("t")).unwrap();
        handle.cache().insert(sample_loop("cid:a", 0.5));

        let found = engine.lookup(&TenantId::new("t"), "cid:a").unwrap();
        assert!(found.is_some());
        assert!(engine.lookup(&TenantId::new("t"), "cid:ghost").unwrap().is_none());
    }
}
