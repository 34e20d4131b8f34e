use fixedbitset::FixedBitSet;
use log::{debug, info};

use crate::{EdgeId, HydroGraph, Length, NodeId, algo::dijkstra::distances_to};

/// Reconnects a selected subset of the network.
///
/// Every subset edge that ends on a dead end of the subset (no outgoing
/// subset edge) while the full network continues is followed downstream
/// through the full network, taking the outgoing edge on the shortest
/// route to a sink, until a node touched by the subset or a sink is
/// reached. Walks that reach the subset add their edges.
///
/// Returns the subset plus the bridging edges, ascending.
pub fn fix_network_connectivity(graph: &HydroGraph, subset: &[EdgeId]) -> Vec<EdgeId> {
    let mut selected = FixedBitSet::with_capacity(graph.edge_count());
    let mut touched = FixedBitSet::with_capacity(graph.node_count());
    for &edge in subset {
        selected.insert(edge.index());
        touched.insert(graph.from_node(edge).index());
        touched.insert(graph.to_node(edge).index());
    }

    let to_sink = distances_to(graph, &graph.sinks(), None);
    let next_edge = |node: NodeId| -> Option<EdgeId> {
        graph.outgoing(node).into_iter().min_by(|&a, &b| {
            let cost = |e: EdgeId| {
                to_sink
                    .get(&graph.to_node(e))
                    .map_or(Length::INFINITY, |d| d + graph.edge_length(e))
            };
            cost(a).total_cmp(&cost(b)).then_with(|| a.cmp(&b))
        })
    };

    let mut added = 0;
    for &edge in subset {
        let start = graph.to_node(edge);
        let continues_in_subset = graph
            .outgoing(start)
            .iter()
            .any(|e| selected.contains(e.index()));
        if continues_in_subset {
            continue;
        }

        let mut walked = Vec::new();
        let mut seen = FixedBitSet::with_capacity(graph.node_count());
        seen.insert(start.index());
        let mut node = start;
        let mut reached = false;
        while let Some(step) = next_edge(node) {
            walked.push(step);
            node = graph.to_node(step);
            if touched.contains(node.index()) {
                reached = true;
                break;
            }
            if seen.put(node.index()) {
                break;
            }
        }

        if reached {
            for step in walked {
                if !selected.put(step.index()) {
                    touched.insert(graph.from_node(step).index());
                    touched.insert(graph.to_node(step).index());
                    debug!("{} added to reconnect the network", graph.feature(step).cleabs);
                    added += 1;
                }
            }
        }
    }

    info!("Network connectivity fixed: {added} bridging edges added");
    selected.ones().map(EdgeId::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineFeature, network::NetworkGraphBuilder};
    use geo::LineString;

    fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
    }

    #[test]
    fn gap_in_subset_is_bridged() {
        let features = vec![
            line("river", &[(0.0, 0.0), (10.0, 0.0)]),
            line("canal", &[(10.0, 0.0), (20.0, 0.0)]),
            line("sea", &[(20.0, 0.0), (30.0, 0.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let fixed = fix_network_connectivity(&graph, &[EdgeId::new(0), EdgeId::new(2)]);
        assert_eq!(fixed, vec![EdgeId::new(0), EdgeId::new(1), EdgeId::new(2)]);
    }

    #[test]
    fn walks_ending_at_a_sink_add_nothing() {
        let features = vec![
            line("river", &[(0.0, 0.0), (10.0, 0.0)]),
            line("canal", &[(10.0, 0.0), (20.0, 0.0)]),
            line("other", &[(50.0, 50.0), (60.0, 50.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let fixed = fix_network_connectivity(&graph, &[EdgeId::new(0), EdgeId::new(2)]);
        assert_eq!(fixed, vec![EdgeId::new(0), EdgeId::new(2)]);
    }
}
