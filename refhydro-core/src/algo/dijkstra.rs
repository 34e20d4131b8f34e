use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;

use crate::{EdgeId, HydroGraph, Length, NodeId};

#[derive(Copy, Clone, Debug, PartialEq)]
struct State {
    cost: Length,
    node: NodeId,
}

impl Eq for State {}

// Min-heap by cost (reversed from standard Rust BinaryHeap)
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest flow distance from every node to the nearest of `targets`,
/// following edges in flow direction. Relaxation runs from the targets
/// against the flow, so only nodes that drain into a target get an
/// entry.
///
/// When `edges` is given, only edges whose bit is set are walked.
pub(crate) fn distances_to(
    graph: &HydroGraph,
    targets: &[NodeId],
    edges: Option<&FixedBitSet>,
) -> HashMap<NodeId, Length> {
    let mut distances: HashMap<NodeId, Length> = HashMap::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::new();

    for &target in targets {
        distances.insert(target, 0.0);
        heap.push(State {
            cost: 0.0,
            node: target,
        });
    }

    while let Some(State { cost, node }) = heap.pop() {
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        for edge in graph.incoming(node) {
            if !is_walkable(edges, edge) {
                continue;
            }
            let next = graph.from_node(edge);
            let next_cost = cost + graph.edge_length(edge);

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    distances
}

fn is_walkable(edges: Option<&FixedBitSet>, edge: EdgeId) -> bool {
    edges.is_none_or(|set| set.contains(edge.index()))
}
