//! # Cycle Enumerator
//!
//! Enumerates elementary directed cycles within a work unit, bounded in
//! length, with bloom-filter-based duplicate suppression (§4.5). The
//! baseline algorithm is a Johnson-style restriction: each vertex is tried
//! as the least vertex of its cycle in turn (ascending order), and the
//! search for cycles through it is confined to the subgraph induced by
//! vertices greater than or equal to it — once a start vertex's cycles are
//! exhausted it is dropped from consideration, so no cycle is ever found
//! twice via a different starting point.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use barter_shared::WalletId;

use crate::canonical::{canonical_id, CycleStep};
use crate::dupfilter::DupFilter;
use crate::scc::WorkUnit;
use crate::view::Edge;

/// A scored-and-canonicalized-pending candidate loop, prior to scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateCycle {
    /// The ordered steps making up the cycle.
    pub steps: Vec<CycleStep>,
    /// The rotation-invariant identifier for this cycle.
    pub canonical_id: String,
}

/// The result of enumerating one work unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumerationOutcome {
    /// Every distinct cycle found, in discovery order.
    pub cycles: Vec<CandidateCycle>,
    /// Set when the wall-clock budget was exhausted before the search
    /// completed (§4.5: "marks the work unit time-bounded").
    pub time_bounded: bool,
}

/// Configuration for one enumeration pass.
#[derive(Clone, Copy, Debug)]
pub struct EnumeratorConfig {
    /// Hard cap on cycle length (tenant `max_depth`, §4.5).
    pub max_depth: usize,
    /// Wall-clock budget for this work unit.
    pub budget: Duration,
}

/// Enumerates elementary cycles of length `2..=config.max_depth` within
/// `unit`, deduplicating against `dedup` (shared across work units within
/// one discovery task so duplicates across SCCs are also suppressed).
#[must_use]
pub fn enumerate(unit: &WorkUnit, config: EnumeratorConfig, dedup: &mut DupFilter) -> EnumerationOutcome {
    let deadline = Instant::now() + config.budget;
    let mut adjacency: HashMap<WalletId, Vec<&Edge>> = HashMap::new();
    for edge in &unit.edges {
        adjacency.entry(edge.from.clone()).or_default().push(edge);
    }
    for edges in adjacency.values_mut() {
        edges.sort_by(|a, b| a.to.cmp(&b.to).then(a.nft.cmp(&b.nft)));
    }

    let mut outcome = EnumerationOutcome::default();
    let ordered_vertices: Vec<&WalletId> = unit.vertices.iter().collect();

    'vertices: for (index, start) in ordered_vertices.iter().enumerate() {
        let allowed: BTreeSet<&WalletId> = ordered_vertices[index..].iter().copied().collect();

        let mut search = Search {
            adjacency: &adjacency,
            allowed,
            start: start.clone(),
            max_depth: config.max_depth,
            deadline,
            path: Vec::new(),
            visited: BTreeSet::new(),
            outcome: &mut outcome,
            dedup,
        };
        search.visited.insert((*start).clone());
        if !search.run(start) {
            outcome.time_bounded = true;
            break 'vertices;
        }
    }

    outcome
}

struct Search<'a> {
    adjacency: &'a HashMap<WalletId, Vec<&'a Edge>>,
    allowed: BTreeSet<&'a WalletId>,
    start: WalletId,
    max_depth: usize,
    deadline: Instant,
    path: Vec<CycleStep>,
    visited: BTreeSet<WalletId>,
    outcome: &'a mut EnumerationOutcome,
    dedup: &'a mut DupFilter,
}

impl Search<'_> {
    /// Returns `false` if the wall-clock budget ran out mid-search.
    fn run(&mut self, current: &WalletId) -> bool {
        if Instant::now() >= self.deadline {
            return false;
        }
        if self.path.len() >= self.max_depth {
            return true;
        }

        let Some(edges) = self.adjacency.get(current) else {
            return true;
        };

        for edge in edges {
            if !self.allowed.contains(&edge.to) {
                continue;
            }

            if edge.to == self.start && self.path.len() + 1 >= 2 {
                self.path.push(CycleStep {
                    wallet: current.clone(),
                    nft: edge.nft.clone(),
                });
                self.emit();
                self.path.pop();
                continue;
            }

            if self.visited.contains(&edge.to) {
                continue;
            }

            self.path.push(CycleStep {
                wallet: current.clone(),
                nft: edge.nft.clone(),
            });
            self.visited.insert(edge.to.clone());

            if !self.run(&edge.to.clone()) {
                self.visited.remove(&edge.to);
                self.path.pop();
                return false;
            }

            self.visited.remove(&edge.to);
            self.path.pop();
        }

        true
    }

    fn emit(&mut self) {
        let id = canonical_id(&self.path);
        if self.dedup.check_and_insert(&id) {
            return;
        }
        self.outcome.cycles.push(CandidateCycle {
            steps: self.path.clone(),
            canonical_id: id,
        });
    }
}
