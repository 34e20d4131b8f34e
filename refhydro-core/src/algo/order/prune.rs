use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_PRUNE_LENGTH, DEFAULT_PRUNE_MIN_ORDER, EdgeId, HydroGraph, Length,
    network::NetworkGraphBuilder,
};

/// Small tributary pruning thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PruneRule {
    /// Longest order-1 edge that may be removed
    pub length_threshold: Length,
    /// Lowest Strahler order of the receiving stream
    pub min_order: u32,
}

impl Default for PruneRule {
    fn default() -> Self {
        Self {
            length_threshold: DEFAULT_PRUNE_LENGTH,
            min_order: DEFAULT_PRUNE_MIN_ORDER,
        }
    }
}

impl PruneRule {
    /// Order-1 edges at most `length_threshold` long whose downstream node
    /// is shared with an edge of order `min_order` or more
    pub fn prunable(&self, graph: &HydroGraph, strahler: &[Option<u32>]) -> Vec<EdgeId> {
        let order_of = |e: EdgeId| strahler.get(e.index()).copied().flatten();
        graph
            .edge_indices()
            .filter(|&e| order_of(e) == Some(1))
            .filter(|&e| graph.edge_length(e) <= self.length_threshold)
            .filter(|&e| {
                let node = graph.to_node(e);
                graph
                    .incoming(node)
                    .into_iter()
                    .chain(graph.outgoing(node))
                    .filter(|&other| other != e)
                    .any(|other| order_of(other).is_some_and(|o| o >= self.min_order))
            })
            .collect()
    }
}

/// Removes the edges matched by `rule` and rebuilds the graph over the
/// remaining features. Returns the new graph and the identifiers pruned.
pub fn prune_small_tributaries(
    graph: &HydroGraph,
    strahler: &[Option<u32>],
    rule: &PruneRule,
) -> (HydroGraph, Vec<String>) {
    let prunable = rule.prunable(graph, strahler);
    let mut removed = vec![false; graph.edge_count()];
    let mut pruned = Vec::with_capacity(prunable.len());
    for edge in prunable {
        removed[edge.index()] = true;
        let cleabs = graph.feature(edge).cleabs.clone();
        debug!("{cleabs} pruned as small tributary");
        pruned.push(cleabs);
    }

    let kept: Vec<_> = graph
        .features_for(graph.edge_indices().filter(|e| !removed[e.index()]));
    let (rebuilt, _) = NetworkGraphBuilder::new(graph.quantization()).build(&kept);
    info!(
        "{} small tributaries pruned (length <= {}, receiving order >= {})",
        pruned.len(),
        rule.length_threshold,
        rule.min_order
    );
    (rebuilt, pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineFeature, network::NetworkGraphBuilder};
    use geo::LineString;

    fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
    }

    fn junction() -> HydroGraph {
        let features = vec![
            line("upper", &[(0.0, 2000.0), (0.0, 1000.0)]),
            line("lower", &[(0.0, 1000.0), (0.0, 0.0)]),
            line("t300", &[(300.0, 1000.0), (0.0, 1000.0)]),
            line("t600", &[(-600.0, 1000.0), (0.0, 1000.0)]),
        ];
        NetworkGraphBuilder::default().build(&features).0
    }

    #[test]
    fn short_first_order_edge_at_major_confluence_is_pruned() {
        let graph = junction();
        let strahler = [Some(3), Some(3), Some(1), Some(1)];
        let (pruned_graph, pruned) =
            prune_small_tributaries(&graph, &strahler, &PruneRule::default());
        assert_eq!(pruned, vec!["t300".to_string()]);
        assert_eq!(pruned_graph.edge_count(), 3);
        assert!(pruned_graph.features().iter().any(|f| f.cleabs == "t600"));
    }

    #[test]
    fn order_two_receivers_are_left_alone() {
        let graph = junction();
        let strahler = [Some(2), Some(2), Some(1), Some(1)];
        let (_, pruned) = prune_small_tributaries(&graph, &strahler, &PruneRule::default());
        assert!(pruned.is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let graph = junction();
        let strahler = [Some(3), Some(3), Some(1), Some(1)];
        let rule = PruneRule {
            length_threshold: 600.0,
            min_order: 3,
        };
        assert_eq!(
            rule.prunable(&graph, &strahler),
            vec![EdgeId::new(2), EdgeId::new(3)]
        );
    }
}
