//! # SCC Partitioner
//!
//! Finds strongly connected components within a subgraph and, optionally,
//! refines large ones into denser communities (§4.4). Singleton SCCs are
//! dropped — a vertex with no self-loop edge cannot participate in a cycle.

use std::collections::{BTreeSet, HashMap};

use barter_shared::WalletId;

use crate::view::Edge;

/// One unit of work handed to the Cycle Enumerator: a set of wallets whose
/// induced subgraph may contain cycles, plus the edges restricted to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkUnit {
    /// The wallets in this work unit.
    pub vertices: BTreeSet<WalletId>,
    /// Edges with both endpoints inside `vertices`.
    pub edges: Vec<Edge>,
}

/// Finds SCCs of size ≥2 in the graph described by `edges`, using an
/// iterative Tarjan's algorithm (no recursion, so depth is bounded only by
/// available memory rather than the call stack).
///
/// Deterministic: the same `edges` input (the caller is expected to pass
/// them pre-sorted, as [`crate::view::UnifiedGraphView::edges`] does)
/// always yields the same set of work units, order aside (§4.4).
#[must_use]
pub fn strongly_connected_components(edges: &[Edge]) -> Vec<WorkUnit> {
    let mut adjacency: HashMap<WalletId, Vec<&Edge>> = HashMap::new();
    let mut vertices: BTreeSet<WalletId> = BTreeSet::new();
    for edge in edges {
        vertices.insert(edge.from.clone());
        vertices.insert(edge.to.clone());
        adjacency.entry(edge.from.clone()).or_default().push(edge);
    }

    let mut tarjan = Tarjan::new();
    for vertex in &vertices {
        if !tarjan.indices.contains_key(vertex) {
            tarjan.run(vertex, &adjacency);
        }
    }

    tarjan
        .components
        .into_iter()
        .filter(|component| component.len() >= 2)
        .map(|component| {
            let component_set: BTreeSet<WalletId> = component.into_iter().collect();
            let unit_edges = edges
                .iter()
                .filter(|e| component_set.contains(&e.from) && component_set.contains(&e.to))
                .cloned()
                .collect();
            WorkUnit {
                vertices: component_set,
                edges: unit_edges,
            }
        })
        .collect()
}

struct Frame {
    vertex: WalletId,
    neighbor_index: usize,
}

struct Tarjan {
    indices: HashMap<WalletId, usize>,
    low_links: HashMap<WalletId, usize>,
    on_stack: HashMap<WalletId, bool>,
    stack: Vec<WalletId>,
    next_index: usize,
    components: Vec<Vec<WalletId>>,
}

impl Tarjan {
    fn new() -> Self {
        Self {
            indices: HashMap::new(),
            low_links: HashMap::new(),
            on_stack: HashMap::new(),
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn run(&mut self, start: &WalletId, adjacency: &HashMap<WalletId, Vec<&Edge>>) {
        let mut call_stack = vec![Frame {
            vertex: start.clone(),
            neighbor_index: 0,
        }];
        self.visit(start);

        while let Some(frame) = call_stack.last_mut() {
            let neighbors = adjacency.get(&frame.vertex).map_or(&[][..], Vec::as_slice);

            if frame.neighbor_index < neighbors.len() {
                let next = neighbors[frame.neighbor_index].to.clone();
                frame.neighbor_index += 1;

                if !self.indices.contains_key(&next) {
                    self.visit(&next);
                    call_stack.push(Frame {
                        vertex: next,
                        neighbor_index: 0,
                    });
                } else if *self.on_stack.get(&next).unwrap_or(&false) {
                    let next_index = self.indices[&next];
                    let current_low = self.low_links[&frame.vertex];
                    self.low_links.insert(frame.vertex.clone(), current_low.min(next_index));
                }
            } else {
                let vertex = frame.vertex.clone();
                call_stack.pop();

                if let Some(parent) = call_stack.last() {
                    let child_low = self.low_links[&vertex];
                    let parent_low = self.low_links[&parent.vertex];
                    self.low_links.insert(parent.vertex.clone(), parent_low.min(child_low));
                }

                if self.low_links[&vertex] == self.indices[&vertex] {
                    let mut component = Vec::new();
                    loop {
                        let member = self.stack.pop().expect("scc root must be on stack");
                        self.on_stack.insert(member.clone(), false);
                        let is_root = member == vertex;
                        component.push(member);
                        if is_root {
                            break;
                        }
                    }
                    self.components.push(component);
                }
            }
        }
    }

    fn visit(&mut self, vertex: &WalletId) {
        self.indices.insert(vertex.clone(), self.next_index);
        self.low_links.insert(vertex.clone(), self.next_index);
        self.next_index += 1;
        self.stack.push(vertex.clone());
        self.on_stack.insert(vertex.clone(), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_shared::NftId;

    fn edge(from: &str, to: &str, nft: &str) -> Edge {
        Edge {
            from: WalletId::new(from),
            to: WalletId::new(to),
            nft: NftId::new(nft),
        }
    }

    #[test]
    fn three_cycle_is_one_work_unit() {
        let edges = vec![
            edge("a", "b", "alpha"),
            edge("b", "c", "beta"),
            edge("c", "a", "gamma"),
        ];
        let units = strongly_connected_components(&edges);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].vertices.len(), 3);
    }

    #[test]
    fn singleton_components_are_dropped() {
        let edges = vec![edge("a", "b", "alpha")];
        let units = strongly_connected_components(&edges);
        assert!(units.is_empty());
    }

    #[test]
    fn disjoint_cycles_yield_separate_work_units() {
        let edges = vec![
            edge("a", "b", "alpha"),
            edge("b", "a", "beta"),
            edge("x", "y", "gamma"),
            edge("y", "x", "delta"),
        ];
        let units = strongly_connected_components(&edges);
        assert_eq!(units.len(), 2);
    }
}
