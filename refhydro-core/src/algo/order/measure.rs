use hashbrown::HashMap;
use log::info;

use crate::{EdgeId, HydroGraph, Length, NodeId, algo::dijkstra::distances_to};

/// Flow distance to the nearest reachable outlet
#[derive(Debug, Clone, Default)]
pub struct Measure {
    to_outlet: HashMap<NodeId, Length>,
    edges: Vec<Option<Length>>,
}

impl Measure {
    /// Distance from the upstream end of `edge`, `None` when the edge
    /// does not drain into an outlet
    pub fn edge(&self, edge: EdgeId) -> Option<Length> {
        self.edges.get(edge.index()).copied().flatten()
    }

    pub fn edges(&self) -> &[Option<Length>] {
        &self.edges
    }

    pub fn node(&self, node: NodeId) -> Option<Length> {
        self.to_outlet.get(&node).copied()
    }

    /// True when `edge` ends on an outlet node
    pub fn is_terminal(&self, graph: &HydroGraph, edge: EdgeId) -> bool {
        self.node(graph.to_node(edge)) == Some(0.0)
    }
}

/// Propagates distances from the outlet nodes upstream. An edge's
/// measure covers its own length plus the distance from its downstream
/// node to the nearest outlet.
pub fn measure_from_outlet(graph: &HydroGraph, outlets: &[NodeId]) -> Measure {
    let to_outlet = distances_to(graph, outlets, None);
    let edges: Vec<Option<Length>> = graph
        .edge_indices()
        .map(|e| {
            to_outlet
                .get(&graph.to_node(e))
                .map(|d| d + graph.edge_length(e))
        })
        .collect();
    info!(
        "Measure computed for {} of {} edges",
        edges.iter().flatten().count(),
        edges.len()
    );
    Measure { to_outlet, edges }
}
