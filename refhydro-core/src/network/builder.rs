use hashbrown::HashSet;
use log::{info, warn};

use super::Quantizer;
use crate::{
    DEFAULT_QUANTIZATION, TopologyWarning,
    model::{HydroEdge, HydroGraph, LineFeature},
};

/// Builds a [`HydroGraph`] from an unordered line collection: every
/// feature becomes an edge from the node of its first vertex to the node
/// of its last vertex.
#[derive(Debug, Clone, Copy)]
pub struct NetworkGraphBuilder {
    quantization: f64,
}

impl Default for NetworkGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_QUANTIZATION)
    }
}

/// Outcome counts of a graph build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub features: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Features excluded for having fewer than two vertices
    pub degenerate: Vec<String>,
    pub warnings: Vec<TopologyWarning>,
}

impl NetworkGraphBuilder {
    pub fn new(quantization: f64) -> Self {
        Self { quantization }
    }

    /// Builds the graph over copies of `features`; the input is not
    /// modified. Degenerate features are left out and reported.
    pub fn build(&self, features: &[LineFeature]) -> (HydroGraph, BuildReport) {
        let quantizer = Quantizer::for_lines(
            features
                .iter()
                .filter(|f| !f.is_degenerate())
                .map(|f| &f.geometry),
            self.quantization,
        );
        let mut graph = HydroGraph::new(quantizer, features.len());
        let mut report = BuildReport {
            features: features.len(),
            ..BuildReport::default()
        };

        for feature in features {
            let (Some(first), Some(last)) = (feature.first_coord(), feature.last_coord()) else {
                report.degenerate.push(feature.cleabs.clone());
                continue;
            };
            if feature.is_degenerate() {
                report.degenerate.push(feature.cleabs.clone());
                continue;
            }

            let from = graph.node_for(first);
            let to = graph.node_for(last);
            let index = graph.features.len();
            graph.features.push(feature.clone());
            graph.graph.add_edge(
                from,
                to,
                HydroEdge {
                    feature: index,
                    length: feature.length(),
                },
            );
        }

        for cleabs in &report.degenerate {
            warn!("Degenerate geometry excluded from network: {cleabs}");
            report
                .warnings
                .push(TopologyWarning::DegenerateGeometry {
                    cleabs: cleabs.clone(),
                });
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        info!(
            "Network built: {} edges, {} nodes ({} degenerate features excluded)",
            report.edges,
            report.nodes,
            report.degenerate.len()
        );
        (graph, report)
    }
}

/// Drops features whose vertex sequence is identical to an earlier one,
/// returning the kept features and the number removed.
pub fn remove_duplicate_geometries(features: Vec<LineFeature>) -> (Vec<LineFeature>, usize) {
    let mut seen = HashSet::with_capacity(features.len());
    let before = features.len();
    let kept: Vec<LineFeature> = features
        .into_iter()
        .filter(|f| seen.insert(f.geometry_key()))
        .collect();
    let removed = before - kept.len();
    if removed > 0 {
        warn!("Duplicate geometry found: {removed}");
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, line_string};

    fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
    }

    #[test]
    fn shared_endpoints_become_one_node() {
        let features = vec![
            line("A", &[(0.0, 0.0), (10.0, 0.0)]),
            line("B", &[(10.0 + 1e-10, 0.0), (20.0, 0.0)]),
        ];
        let (graph, report) = NetworkGraphBuilder::default().build(&features);
        assert_eq!(report.edges, 2);
        assert_eq!(graph.node_count(), 3);
        let edges: Vec<_> = graph.edge_indices().collect();
        assert_eq!(graph.to_node(edges[0]), graph.from_node(edges[1]));
        assert_eq!(graph.degree(graph.to_node(edges[0])), 2);
    }

    #[test]
    fn degenerate_features_are_reported_not_fatal() {
        let features = vec![
            line("A", &[(0.0, 0.0), (10.0, 0.0)]),
            LineFeature::new("B", line_string![(x: 3.0, y: 3.0)]),
            LineFeature::new("C", LineString::new(vec![])),
        ];
        let (graph, report) = NetworkGraphBuilder::default().build(&features);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.degenerate, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn input_is_untouched_and_node_lookup_works() {
        let features = vec![line("A", &[(0.0, 0.0), (5.0, 5.0)])];
        let before = features.clone();
        let (graph, _) = NetworkGraphBuilder::new(1e6).build(&features);
        assert_eq!(features, before);
        assert!(graph.node_at(Coord { x: 5.0, y: 5.0 }).is_some());
        assert!(graph.node_at(Coord { x: 2.0, y: 5.0 }).is_none());
    }

    #[test]
    fn duplicate_geometries_keep_first() {
        let features = vec![
            line("A", &[(0.0, 0.0), (1.0, 0.0)]),
            line("B", &[(0.0, 0.0), (1.0, 0.0)]),
            line("C", &[(1.0, 0.0), (0.0, 0.0)]),
        ];
        let (kept, removed) = remove_duplicate_geometries(features);
        assert_eq!(removed, 1);
        assert_eq!(
            kept.iter().map(|f| f.cleabs.as_str()).collect::<Vec<_>>(),
            vec!["A", "C"]
        );
    }

    #[test]
    fn signed_zero_coordinates_are_duplicates() {
        let features = vec![
            line("A", &[(0.0, 5.0), (10.0, 0.0)]),
            line("B", &[(-0.0, 5.0), (10.0, -0.0)]),
        ];
        let (kept, removed) = remove_duplicate_geometries(features);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].cleabs, "A");
    }
}
