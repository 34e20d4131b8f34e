use std::collections::VecDeque;

use petgraph::algo::tarjan_scc;

use crate::{EdgeId, HydroGraph};

/// Edges lying on a cycle: both ends in the same strongly connected
/// component, self loops included
fn cyclic_edges(graph: &HydroGraph) -> Vec<bool> {
    let mut component = vec![usize::MAX; graph.node_count()];
    let mut sizes = Vec::new();
    for (i, scc) in tarjan_scc(&graph.graph).into_iter().enumerate() {
        for node in &scc {
            component[node.index()] = i;
        }
        sizes.push(scc.len());
    }
    graph
        .edge_indices()
        .map(|edge| {
            let (from, to) = (graph.from_node(edge), graph.to_node(edge));
            from == to
                || (component[from.index()] == component[to.index()]
                    && sizes[component[from.index()]] > 1)
        })
        .collect()
}

/// Edges in an order where every edge comes after all edges feeding its
/// upstream node.
///
/// Edges on a cycle are returned separately, together with edges whose
/// upstream node is fed only by skipped edges. An edge fed by at least one
/// ordered edge stays ordered.
pub(super) fn upstream_first(graph: &HydroGraph) -> (Vec<EdgeId>, Vec<EdgeId>) {
    let cyclic = cyclic_edges(graph);
    let mut pending: Vec<usize> = graph
        .node_indices()
        .map(|n| {
            graph
                .incoming(n)
                .into_iter()
                .filter(|e| !cyclic[e.index()])
                .count()
        })
        .collect();
    let mut queue: VecDeque<_> = graph
        .node_indices()
        .filter(|n| pending[n.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(graph.edge_count());
    let mut ordered = vec![false; graph.edge_count()];

    while let Some(node) = queue.pop_front() {
        let incoming = graph.incoming(node);
        let fed_by_skipped =
            !incoming.is_empty() && incoming.iter().all(|e| !ordered[e.index()]);
        for edge in graph.outgoing(node) {
            if cyclic[edge.index()] {
                continue;
            }
            if !fed_by_skipped {
                order.push(edge);
                ordered[edge.index()] = true;
            }
            let next = graph.to_node(edge);
            pending[next.index()] -= 1;
            if pending[next.index()] == 0 {
                queue.push_back(next);
            }
        }
    }

    let skipped = graph
        .edge_indices()
        .filter(|e| !ordered[e.index()])
        .collect();
    (order, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineFeature, network::NetworkGraphBuilder};
    use geo::LineString;

    fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
    }

    fn ids(graph: &HydroGraph, edges: &[EdgeId]) -> Vec<String> {
        edges
            .iter()
            .map(|&e| graph.feature(e).cleabs.clone())
            .collect()
    }

    #[test]
    fn acyclic_branches_below_a_loop_stay_ordered() {
        let features = vec![
            line("ring", &[(0.0, 20.0), (5.0, 25.0), (-5.0, 25.0), (0.0, 20.0)]),
            line("below_ring", &[(0.0, 20.0), (0.0, 10.0)]),
            line("trib", &[(10.0, 10.0), (0.0, 10.0)]),
            line("mouth", &[(0.0, 10.0), (0.0, 0.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let (order, skipped) = upstream_first(&graph);
        assert_eq!(ids(&graph, &order), vec!["trib", "mouth"]);
        assert_eq!(ids(&graph, &skipped), vec!["ring", "below_ring"]);
    }
}
