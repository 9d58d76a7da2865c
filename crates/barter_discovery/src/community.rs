//! # Community Refinement
//!
//! Splits a large SCC into denser subcommunities before cycle enumeration
//! (§4.4, feature-flag gated and disabled by default — see the Open
//! Questions decision recorded in `DESIGN.md`). Uses label propagation: a
//! simple, well-understood approximation to modularity optimization that
//! needs no external solver dependency, appropriate for a bounded refinement
//! pass rather than a from-scratch community-detection subsystem.

use std::collections::HashMap;

use barter_shared::WalletId;

use crate::scc::WorkUnit;

/// Label-propagation iterations to run before accepting whatever partition
/// has formed. Five iterations is more than enough for graphs the size this
/// refinement pass is meant for (hundreds to low thousands of vertices).
const MAX_ITERATIONS: usize = 5;

/// Splits `unit` into subcommunities via label propagation. Returns a
/// single-element vector containing `unit` unchanged if propagation
/// collapses to one label (i.e. the SCC was already cohesive).
#[must_use]
pub fn refine(unit: &WorkUnit) -> Vec<WorkUnit> {
    let mut labels: HashMap<WalletId, WalletId> = unit
        .vertices
        .iter()
        .map(|v| (v.clone(), v.clone()))
        .collect();

    let mut neighbors: HashMap<WalletId, Vec<WalletId>> = HashMap::new();
    for edge in &unit.edges {
        neighbors.entry(edge.from.clone()).or_default().push(edge.to.clone());
        neighbors.entry(edge.to.clone()).or_default().push(edge.from.clone());
    }

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for vertex in &unit.vertices {
            let Some(adjacent) = neighbors.get(vertex) else {
                continue;
            };
            let mut counts: HashMap<WalletId, usize> = HashMap::new();
            for n in adjacent {
                *counts.entry(labels[n].clone()).or_insert(0) += 1;
            }
            let Some(best_label) = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(label, _)| label)
            else {
                continue;
            };
            if labels[vertex] != best_label {
                labels.insert(vertex.clone(), best_label);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut groups: HashMap<WalletId, Vec<WalletId>> = HashMap::new();
    for (vertex, label) in &labels {
        groups.entry(label.clone()).or_default().push(vertex.clone());
    }

    groups
        .into_values()
        .map(|members| {
            let vertex_set: std::collections::BTreeSet<WalletId> = members.into_iter().collect();
            let edges = unit
                .edges
                .iter()
                .filter(|e| vertex_set.contains(&e.from) && vertex_set.contains(&e.to))
                .cloned()
                .collect();
            WorkUnit {
                vertices: vertex_set,
                edges,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_shared::NftId;
    use crate::view::Edge;

    fn edge(from: &str, to: &str, nft: &str) -> Edge {
        Edge {
            from: WalletId::new(from),
            to: WalletId::new(to),
            nft: NftId::new(nft),
        }
    }

    #[test]
    fn two_disjoint_triangles_joined_by_one_edge_refine_into_two_groups() {
        let edges = vec![
            edge("a", "b", "1"), edge("b", "c", "2"), edge("c", "a", "3"),
            edge("x", "y", "4"), edge("y", "z", "5"), edge("z", "x", "6"),
            edge("c", "x", "7"),
        ];
        let vertices = edges.iter().flat_map(|e| [e.from.clone(), e.to.clone()]).collect();
        let unit = WorkUnit { vertices, edges };

        let refined = refine(&unit);
        assert!(refined.len() >= 2);
    }

    #[test]
    fn a_single_tight_cycle_stays_one_group() {
        let edges = vec![edge("a", "b", "1"), edge("b", "c", "2"), edge("c", "a", "3")];
        let vertices = edges.iter().flat_map(|e| [e.from.clone(), e.to.clone()]).collect();
        let unit = WorkUnit { vertices, edges };

        let refined = refine(&unit);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].vertices.len(), 3);
    }
}
