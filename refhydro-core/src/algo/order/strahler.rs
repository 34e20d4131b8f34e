use log::warn;

use super::topo::upstream_first;
use crate::{HydroGraph, TopologyWarning};

/// Strahler order per edge.
///
/// Edges leaving a source get order 1. Below a confluence the order is
/// the highest incoming order, plus one when at least two incoming edges
/// share it. Edges on a cycle, or fed only through one, stay `None`.
pub fn strahler_order(graph: &HydroGraph) -> (Vec<Option<u32>>, Vec<TopologyWarning>) {
    let (order, skipped) = upstream_first(graph);
    let mut strahler: Vec<Option<u32>> = vec![None; graph.edge_count()];

    for edge in order {
        let upstream: Vec<u32> = graph
            .incoming(graph.from_node(edge))
            .into_iter()
            .filter_map(|e| strahler[e.index()])
            .collect();
        let value = match upstream.iter().max() {
            None => 1,
            Some(&max) if upstream.iter().filter(|&&o| o == max).count() >= 2 => max + 1,
            Some(&max) => max,
        };
        strahler[edge.index()] = Some(value);
    }

    let mut warnings = Vec::new();
    if !skipped.is_empty() {
        warn!(
            "Strahler order skipped {} edges on or fed only by a cycle",
            skipped.len()
        );
        warnings.push(TopologyWarning::CycleSkipped {
            edges: skipped.len(),
        });
    }
    (strahler, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeId, LineFeature, network::NetworkGraphBuilder};
    use geo::LineString;
    use proptest::prelude::*;

    fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
    }

    #[test]
    fn confluences_follow_the_strahler_rule() {
        // Two order-1 pairs make two order-2 streams that meet in an order-3 trunk,
        // then an order-1 tributary joins without raising it
        let features = vec![
            line("s1", &[(0.0, 40.0), (10.0, 30.0)]),
            line("s2", &[(20.0, 40.0), (10.0, 30.0)]),
            line("o2a", &[(10.0, 30.0), (20.0, 20.0)]),
            line("s3", &[(40.0, 40.0), (30.0, 30.0)]),
            line("s4", &[(40.0, 20.0), (30.0, 30.0)]),
            line("o2b", &[(30.0, 30.0), (20.0, 20.0)]),
            line("trunk", &[(20.0, 20.0), (20.0, 10.0)]),
            line("s5", &[(30.0, 10.0), (20.0, 10.0)]),
            line("mouth", &[(20.0, 10.0), (20.0, 0.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let (orders, warnings) = strahler_order(&graph);
        let by_id = |id: &str| {
            graph
                .edge_indices()
                .find(|&e| graph.feature(e).cleabs == id)
                .and_then(|e| orders[e.index()])
        };
        assert_eq!(by_id("s1"), Some(1));
        assert_eq!(by_id("o2a"), Some(2));
        assert_eq!(by_id("o2b"), Some(2));
        assert_eq!(by_id("trunk"), Some(3));
        assert_eq!(by_id("mouth"), Some(3));
        assert!(warnings.is_empty());
    }

    #[test]
    fn cycles_are_left_unassigned() {
        let features = vec![
            line("in", &[(-10.0, 0.0), (0.0, 0.0)]),
            line("a", &[(0.0, 0.0), (10.0, 0.0)]),
            line("b", &[(10.0, 0.0), (10.0, 10.0)]),
            line("c", &[(10.0, 10.0), (0.0, 0.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let (orders, warnings) = strahler_order(&graph);
        assert_eq!(orders[0], Some(1));
        assert_eq!(orders[EdgeId::new(1).index()], None);
        assert_eq!(warnings, vec![TopologyWarning::CycleSkipped { edges: 3 }]);
    }

    #[test]
    fn headwater_loop_keeps_orders_downstream() {
        let features = vec![
            line("ring", &[(0.0, 20.0), (5.0, 25.0), (-5.0, 25.0), (0.0, 20.0)]),
            line("src", &[(0.0, 20.0), (0.0, 10.0)]),
            line("trib", &[(10.0, 10.0), (0.0, 10.0)]),
            line("mouth", &[(0.0, 10.0), (0.0, 0.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let (orders, warnings) = strahler_order(&graph);
        assert_eq!(orders, vec![None, None, Some(1), Some(1)]);
        assert_eq!(warnings, vec![TopologyWarning::CycleSkipped { edges: 2 }]);
    }

    /// Full binary tree of `depth` levels, flowing to the root at (0, 0)
    fn binary_tree(depth: u32) -> Vec<LineFeature> {
        let mut features = Vec::new();
        let mut frontier = vec![(0.0_f64, 0.0_f64)];
        for level in 0..depth {
            let spread = f64::from(1u32 << (depth - level));
            let mut next = Vec::new();
            for (x, y) in frontier {
                for dx in [-spread, spread] {
                    let child = (x + dx, y + 10.0);
                    features.push(line(&format!("{level}-{}", features.len()), &[child, (x, y)]));
                    next.push(child);
                }
            }
            frontier = next;
        }
        features
    }

    proptest! {
        #[test]
        fn full_binary_tree_root_order_equals_depth(depth in 1u32..7) {
            let (graph, _) = NetworkGraphBuilder::default().build(&binary_tree(depth));
            let (orders, _) = strahler_order(&graph);
            // Root edges are the first two inserted
            prop_assert_eq!(orders[0], Some(depth));
            prop_assert_eq!(orders[1], Some(depth));
            let leaves = orders.iter().filter(|o| **o == Some(1)).count();
            prop_assert_eq!(leaves, 1usize << depth);
        }
    }
}
