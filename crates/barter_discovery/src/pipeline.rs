//! # Discovery Pipeline
//!
//! Wires the Unified Graph View, SCC Partitioner, optional community
//! refinement, and Cycle Enumerator into the single synchronous kernel a
//! worker task runs per affected community (§5, §9: "a synchronous
//! enumeration kernel called from worker tasks; suspension only at batch
//! boundaries"). Canonicalization happens inside the enumerator; this
//! module's job is ordering the stages and splitting the tenant's
//! wall-clock budget across work units.

use std::time::Duration;

use barter_core::TenantConfig;

use crate::community;
use crate::cycles::{self, CandidateCycle, EnumeratorConfig};
use crate::dupfilter::DupFilter;
use crate::scc::{self, WorkUnit};
use crate::view::UnifiedGraphView;

/// The result of running the full pipeline once.
#[derive(Clone, Debug, Default)]
pub struct PipelineOutcome {
    /// Every distinct candidate cycle found, across all work units.
    pub cycles: Vec<CandidateCycle>,
    /// Set if any work unit exhausted its wall-clock budget.
    pub time_bounded: bool,
}

/// Runs the SCC → (optional community refinement) → Cycle Enumerator chain
/// over `view`, honoring `config`'s feature flags and limits.
#[must_use]
pub fn discover(view: &UnifiedGraphView<'_>, config: &TenantConfig) -> PipelineOutcome {
    let edges = view.edges();

    let work_units: Vec<WorkUnit> = if config.features.scc_partitioning {
        scc::strongly_connected_components(&edges)
    } else {
        let vertices = view.vertices();
        if vertices.is_empty() {
            Vec::new()
        } else {
            vec![WorkUnit { vertices, edges: edges.clone() }]
        }
    };

    let refined: Vec<WorkUnit> = if config.features.community_detection {
        work_units
            .into_iter()
            .flat_map(|unit| {
                if unit.vertices.len() > config.community_refinement_threshold {
                    let mut groups = community::refine(&unit);
                    if groups.len() > 1 {
                        // §4.4: refinement restricts each subcommunity's
                        // work unit to its own intra-group edges, so a cycle
                        // spanning two subcommunities can never be found by
                        // those passes alone. Re-enumerate the unrefined unit
                        // as one more work unit; `dedup` is shared across
                        // every work unit in this unit's flattening, so the
                        // intra-group cycles already found above are
                        // suppressed and only boundary-crossing cycles
                        // survive from this pass.
                        groups.push(unit);
                    }
                    groups
                } else {
                    vec![unit]
                }
            })
            .collect()
    } else {
        work_units
    };

    if refined.is_empty() {
        return PipelineOutcome::default();
    }

    let per_unit_budget = Duration::from_millis(config.discovery_timeout_ms) / refined.len() as u32;
    let mut dedup = DupFilter::with_capacity(refined.iter().map(|u| u.edges.len()).sum::<usize>().max(16), 1e-6);

    let mut outcome = PipelineOutcome::default();
    for unit in &refined {
        let unit_outcome = cycles::enumerate(
            unit,
            EnumeratorConfig {
                max_depth: config.max_depth,
                budget: per_unit_budget,
            },
            &mut dedup,
        );
        outcome.cycles.extend(unit_outcome.cycles);
        outcome.time_bounded |= unit_outcome.time_bounded;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::{NftMetadata, TenantGraph, Want};
    use barter_shared::{NftId, TenantId, WalletId};

    #[test]
    fn discovers_the_minimal_three_cycle() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph.add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, NftMetadata::default(), 0).unwrap();
        graph.add_nft(NftId::new("beta"), WalletId::new("b"), None, None, NftMetadata::default(), 0).unwrap();
        graph.add_nft(NftId::new("gamma"), WalletId::new("c"), None, None, NftMetadata::default(), 0).unwrap();
        graph.add_want(WalletId::new("a"), Want::Specific(NftId::new("beta")), 0).unwrap();
        graph.add_want(WalletId::new("b"), Want::Specific(NftId::new("gamma")), 0).unwrap();
        graph.add_want(WalletId::new("c"), Want::Specific(NftId::new("alpha")), 0).unwrap();

        let snapshot = graph.snapshot();
        let view = UnifiedGraphView::new(&snapshot, true);
        let config = TenantConfig::default();

        let outcome = discover(&view, &config);
        assert_eq!(outcome.cycles.len(), 1);
    }

    #[test]
    fn no_edges_yields_no_cycles() {
        let graph = TenantGraph::new(TenantId::new("t"));
        graph.add_nft(NftId::new("alpha"), WalletId::new("a"), None, None, NftMetadata::default(), 0).unwrap();
        let snapshot = graph.snapshot();
        let view = UnifiedGraphView::new(&snapshot, true);
        let config = TenantConfig::default();

        let outcome = discover(&view, &config);
        assert!(outcome.cycles.is_empty());
    }

    #[test]
    fn community_refinement_preserves_cycles_crossing_subcommunity_boundaries() {
        // Two triangles (a-b-c, x-y-z) joined by a pair of single-edge
        // bridges (c->x, z->a). Each triangle's own 3-cycle survives
        // per-subcommunity enumeration; the 6-cycle that crosses both
        // subcommunities only survives because of the second, unrefined
        // pass over the whole SCC.
        let graph = TenantGraph::new(TenantId::new("t"));
        for (nft, owner) in [
            ("n_ab", "a"),
            ("n_bc", "b"),
            ("n_ca", "c"),
            ("n_xy", "x"),
            ("n_yz", "y"),
            ("n_zx", "z"),
            ("bridge_cx", "c"),
            ("bridge_za", "z"),
        ] {
            graph
                .add_nft(NftId::new(nft), WalletId::new(owner), None, None, NftMetadata::default(), 0)
                .unwrap();
        }
        graph.add_want(WalletId::new("b"), Want::Specific(NftId::new("n_ab")), 0).unwrap();
        graph.add_want(WalletId::new("c"), Want::Specific(NftId::new("n_bc")), 0).unwrap();
        graph.add_want(WalletId::new("a"), Want::Specific(NftId::new("n_ca")), 0).unwrap();
        graph.add_want(WalletId::new("y"), Want::Specific(NftId::new("n_xy")), 0).unwrap();
        graph.add_want(WalletId::new("z"), Want::Specific(NftId::new("n_yz")), 0).unwrap();
        graph.add_want(WalletId::new("x"), Want::Specific(NftId::new("n_zx")), 0).unwrap();
        graph.add_want(WalletId::new("x"), Want::Specific(NftId::new("bridge_cx")), 0).unwrap();
        graph.add_want(WalletId::new("a"), Want::Specific(NftId::new("bridge_za")), 0).unwrap();

        let snapshot = graph.snapshot();
        let view = UnifiedGraphView::new(&snapshot, true);
        let mut config = TenantConfig::default();
        config.features.community_detection = true;
        config.community_refinement_threshold = 2;
        config.max_depth = 6;

        let outcome = discover(&view, &config);
        assert_eq!(outcome.cycles.len(), 3);
        let lengths: std::collections::BTreeSet<usize> =
            outcome.cycles.iter().map(|c| c.steps.len()).collect();
        assert_eq!(lengths, std::collections::BTreeSet::from([3, 6]));
    }
}
