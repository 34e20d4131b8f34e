//! Node-indexed directed graph of the hydrographic network

use geo::{Coord, Point};
use hashbrown::HashMap;
use petgraph::{Direction, graph::DiGraph, visit::EdgeRef};

use super::{LineFeature, NodeRecord};
use crate::{EdgeId, NodeId, network::Quantizer};

/// Working field holding the upstream node id, dropped from reach layers
pub const NODE_A_FIELD: &str = "NODEA";
/// Working field holding the downstream node id, dropped from reach layers
pub const NODE_B_FIELD: &str = "NODEB";

/// Endpoint coordinate snapped to the quantization grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub x: i64,
    pub y: i64,
}

/// Graph node: one per distinct quantized endpoint
#[derive(Debug, Clone)]
pub struct HydroNode {
    pub key: NodeKey,
    /// Coordinate of the first endpoint that created the node
    pub geometry: Point<f64>,
}

/// Graph edge, oriented in flow direction
#[derive(Debug, Clone)]
pub struct HydroEdge {
    /// Position of the feature in [`HydroGraph::features`]
    pub feature: usize,
    pub length: f64,
}

/// Directed graph over a line feature collection. Rebuilt from scratch
/// whenever the underlying collection changes.
#[derive(Debug, Clone)]
pub struct HydroGraph {
    pub graph: DiGraph<HydroNode, HydroEdge>,
    pub(crate) node_lookup: HashMap<NodeKey, NodeId>,
    pub(crate) features: Vec<LineFeature>,
    pub(crate) quantizer: Quantizer,
}

impl HydroGraph {
    pub(crate) fn new(quantizer: Quantizer, capacity: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(capacity, capacity),
            node_lookup: HashMap::with_capacity(capacity),
            features: Vec::with_capacity(capacity),
            quantizer,
        }
    }

    pub(crate) fn node_for(&mut self, coord: Coord<f64>) -> NodeId {
        let key = self.quantizer.key(coord);
        *self.node_lookup.entry(key).or_insert_with(|| {
            self.graph.add_node(HydroNode {
                key,
                geometry: coord.into(),
            })
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn quantization(&self) -> f64 {
        self.quantizer.quantization()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.graph.edge_indices()
    }

    /// Features in edge order: edge `e` carries `features()[graph[e].feature]`
    pub fn features(&self) -> &[LineFeature] {
        &self.features
    }

    pub fn feature(&self, edge: EdgeId) -> &LineFeature {
        &self.features[self.graph[edge].feature]
    }

    pub fn edge_length(&self, edge: EdgeId) -> f64 {
        self.graph[edge].length
    }

    pub fn from_node(&self, edge: EdgeId) -> NodeId {
        self.graph.raw_edges()[edge.index()].source()
    }

    pub fn to_node(&self, edge: EdgeId) -> NodeId {
        self.graph.raw_edges()[edge.index()].target()
    }

    pub fn node(&self, node: NodeId) -> &HydroNode {
        &self.graph[node]
    }

    /// Node sharing the quantized key of `coord`, if any
    pub fn node_at(&self, coord: Coord<f64>) -> Option<NodeId> {
        self.node_lookup.get(&self.quantizer.key(coord)).copied()
    }

    /// Edges ending at `node`, in ascending index order
    pub fn incoming(&self, node: NodeId) -> Vec<EdgeId> {
        self.edges_sorted(node, Direction::Incoming)
    }

    /// Edges starting at `node`, in ascending index order
    pub fn outgoing(&self, node: NodeId) -> Vec<EdgeId> {
        self.edges_sorted(node, Direction::Outgoing)
    }

    fn edges_sorted(&self, node: NodeId, direction: Direction) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self
            .graph
            .edges_directed(node, direction)
            .map(|e| e.id())
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.graph.edges_directed(node, Direction::Incoming).count()
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
    }

    /// Count of incident edges, both directions
    pub fn degree(&self, node: NodeId) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    /// Nodes without outgoing edges
    pub fn sinks(&self) -> Vec<NodeId> {
        self.node_indices()
            .filter(|&n| self.out_degree(n) == 0)
            .collect()
    }

    /// Copies of the features carried by `edges`, in the given order
    pub fn features_for(&self, edges: impl IntoIterator<Item = EdgeId>) -> Vec<LineFeature> {
        edges.into_iter().map(|e| self.feature(e).clone()).collect()
    }

    /// Node layer for diagnostics
    pub fn node_records(&self) -> Vec<NodeRecord> {
        self.node_indices()
            .map(|n| NodeRecord {
                gid: n.index(),
                geometry: self.graph[n].geometry,
                in_degree: self.in_degree(n),
                out_degree: self.out_degree(n),
            })
            .collect()
    }
}
