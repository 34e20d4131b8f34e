use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use log::{debug, info};

use crate::{EdgeId, HydroGraph, Length, algo::dijkstra::distances_to};

/// Removes secondary channels of braided reaches.
///
/// Where a node has several outgoing edges, only the one on the shortest
/// route to a network sink is kept (equal routes keep the lowest edge
/// index). Edges downstream of a dropped branch are dropped too until
/// the channel rejoins the kept network or receives a tributary coming
/// from a true source.
///
/// Returns the kept edges in ascending order.
pub fn principal_stem(graph: &HydroGraph) -> Vec<EdgeId> {
    let sinks = graph.sinks();
    let to_sink = distances_to(graph, &sinks, None);
    let route = |edge: EdgeId| -> Length {
        to_sink
            .get(&graph.to_node(edge))
            .map_or(Length::INFINITY, |d| d + graph.edge_length(edge))
    };

    let mut kept = FixedBitSet::with_capacity(graph.edge_count());
    kept.insert_range(..);
    let mut queue = VecDeque::new();

    for node in graph.node_indices() {
        let outgoing = graph.outgoing(node);
        if outgoing.len() < 2 {
            continue;
        }
        let best = outgoing
            .iter()
            .copied()
            .min_by(|&a, &b| route(a).total_cmp(&route(b)).then_with(|| a.cmp(&b)));
        for edge in outgoing {
            if Some(edge) != best {
                kept.set(edge.index(), false);
                queue.push_back(graph.to_node(edge));
            }
        }
    }

    // Channels left without any kept inflow lose their downstream edges
    while let Some(node) = queue.pop_front() {
        let incoming = graph.incoming(node);
        if incoming.is_empty() || incoming.iter().any(|e| kept.contains(e.index())) {
            continue;
        }
        for edge in graph.outgoing(node) {
            if kept.contains(edge.index()) {
                kept.set(edge.index(), false);
                debug!("{} dropped as secondary channel", graph.feature(edge).cleabs);
                queue.push_back(graph.to_node(edge));
            }
        }
    }

    let edges: Vec<EdgeId> = kept.ones().map(EdgeId::new).collect();
    info!(
        "Principal stem: {} of {} edges kept",
        edges.len(),
        graph.edge_count()
    );
    edges
}
