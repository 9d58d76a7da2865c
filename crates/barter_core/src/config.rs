//! # Tenant Configuration
//!
//! One `TenantConfig` is attached to a tenant at creation and governs every
//! downstream component: algorithm limits, feature flags, and per-tenant
//! rate limits (§3).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Number of scoring dimensions a weight vector must carry (§4.7).
pub const SCORE_DIMENSIONS: usize = 18;

/// Feature flags gating optional algorithm behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Whether collection wants are resolved at all. When disabled, the
    /// Unified Graph View's `wanters()` returns only specific-wanters.
    pub collection_wants: bool,
    /// Whether the SCC Partitioner runs at all. Disabling it is only
    /// meaningful for tiny graphs exercised in tests; production tenants
    /// should leave this on.
    pub scc_partitioning: bool,
    /// Whether large SCCs are further split by community detection before
    /// cycle enumeration. Conservative default: disabled (§9, Open
    /// Questions — net benefit is empirical).
    pub community_detection: bool,
    /// Whether the Cycle Enumerator's bloom filter also checks against
    /// loops already present in the Active Loop Cache, not just loops
    /// emitted earlier in the current run.
    pub bloom_dedup_against_cache: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            collection_wants: true,
            scc_partitioning: true,
            community_detection: false,
            bloom_dedup_against_cache: true,
        }
    }
}

/// Per-tenant algorithm limits, feature flags, and resource policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Hard cap on trade loop length (2 ≤ length ≤ `max_depth`).
    pub max_depth: usize,
    /// Minimum aggregate score (0.0–1.0) for a candidate loop to be kept.
    pub min_score_threshold: f64,
    /// Maximum loops returned from a single `discover` call.
    pub max_results_per_query: usize,
    /// Feature flags for this tenant.
    pub features: FeatureFlags,
    /// Bound on the affected-community closure before the Delta Detector
    /// degrades to a full-graph pass (§4.2).
    pub max_community_size: usize,
    /// SCC size above which community refinement is attempted, when the
    /// `community_detection` flag is enabled (§4.4).
    pub community_refinement_threshold: usize,
    /// Width of this tenant's dedicated worker pool. A value of zero means
    /// "number of physical cores" is resolved by the concurrency layer.
    pub worker_pool_width: usize,
    /// Wall-clock budget, in milliseconds, for a single discovery task
    /// before it returns partial results (§5, default 30s).
    pub discovery_timeout_ms: u64,
    /// How long, in milliseconds, a `completed`/`cancelled` loop is kept
    /// before `compact()` may drop it (§4.8).
    pub loop_retention_ms: u64,
    /// Maximum events the tenant's ingestion channel may buffer before
    /// `TenantBusy` is returned (§5, backpressure).
    pub event_channel_capacity: usize,
    /// The 18 scoring weights (§4.7); must sum to 1.0. Order is defined by
    /// `barter_scoring::ScoreDimension`'s discriminant order.
    pub score_weights: [f64; SCORE_DIMENSIONS],
}

impl TenantConfig {
    /// Equal weight across all 18 dimensions — a reasonable, if naive,
    /// starting point before a tenant supplies its own vector.
    #[must_use]
    pub fn uniform_weights() -> [f64; SCORE_DIMENSIONS] {
        [1.0 / SCORE_DIMENSIONS as f64; SCORE_DIMENSIONS]
    }

    /// Validates invariants that must hold for a config to be usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if `max_depth` is below 2, if
    /// `min_score_threshold` is outside `[0.0, 1.0]`, or if the weight
    /// vector does not sum to 1.0 within tolerance.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_depth < 2 {
            return Err(EngineError::InvalidInput(
                "max_depth must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score_threshold) {
            return Err(EngineError::InvalidInput(
                "min_score_threshold must be within [0.0, 1.0]".to_string(),
            ));
        }
        let sum: f64 = self.score_weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::InvalidInput(format!(
                "score_weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    /// Loads a config from a TOML file (operator-facing defaults; the
    /// in-process path is just constructing this struct directly).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if the file cannot be read or
    /// parsed, or if the parsed config fails [`TenantConfig::validate`].
    pub fn from_toml(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::InvalidInput(format!("reading config: {e}")))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| EngineError::InvalidInput(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_score_threshold: 0.35,
            max_results_per_query: 50,
            features: FeatureFlags::default(),
            max_community_size: 5_000,
            community_refinement_threshold: 200,
            worker_pool_width: 0,
            discovery_timeout_ms: 30_000,
            loop_retention_ms: 24 * 60 * 60 * 1000,
            event_channel_capacity: 4_096,
            score_weights: Self::uniform_weights(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TenantConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_depth_below_two() {
        let mut config = TenantConfig::default();
        config.max_depth = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_weight_vector_not_summing_to_one() {
        let mut config = TenantConfig::default();
        config.score_weights[0] += 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_toml_rejects_missing_file() {
        assert!(TenantConfig::from_toml("/nonexistent/path.toml").is_err());
    }
}
