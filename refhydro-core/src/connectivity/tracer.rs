use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{EdgeId, HydroGraph, NodeId};

/// Traversal direction relative to the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Against the flow, from an outlet towards the sources
    Upstream,
    /// With the flow
    Downstream,
    /// Edges treated as undirected
    #[default]
    Both,
}

/// Nodes reached from the seeds and the edges they induce
#[derive(Debug, Clone, PartialEq)]
pub struct TraceResult {
    pub nodes: FixedBitSet,
    /// Edges with at least one visited endpoint, ascending
    pub edges: Vec<EdgeId>,
}

impl TraceResult {
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node.index())
    }
}

/// Breadth-first reachability over a [`HydroGraph`]
pub struct ConnectivityTracer<'a> {
    graph: &'a HydroGraph,
}

impl<'a> ConnectivityTracer<'a> {
    pub fn new(graph: &'a HydroGraph) -> Self {
        Self { graph }
    }

    pub fn trace(&self, seeds: &[NodeId], direction: Direction) -> TraceResult {
        let graph = self.graph;
        let mut visited = FixedBitSet::with_capacity(graph.node_count());
        let mut queue: VecDeque<NodeId> = VecDeque::new();

        for &seed in seeds {
            if seed.index() < graph.node_count() && !visited.put(seed.index()) {
                queue.push_back(seed);
            }
        }

        while let Some(node) = queue.pop_front() {
            let upstream = matches!(direction, Direction::Upstream | Direction::Both);
            let downstream = matches!(direction, Direction::Downstream | Direction::Both);

            if upstream {
                for edge in graph.incoming(node) {
                    let next = graph.from_node(edge);
                    if !visited.put(next.index()) {
                        queue.push_back(next);
                    }
                }
            }
            if downstream {
                for edge in graph.outgoing(node) {
                    let next = graph.to_node(edge);
                    if !visited.put(next.index()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        let edges: Vec<EdgeId> = graph
            .edge_indices()
            .filter(|&e| {
                visited.contains(graph.from_node(e).index())
                    || visited.contains(graph.to_node(e).index())
            })
            .collect();

        info!(
            "Trace {:?} from {} seeds: {} nodes, {} edges",
            direction,
            seeds.len(),
            visited.count_ones(..),
            edges.len()
        );
        TraceResult {
            nodes: visited,
            edges,
        }
    }
}
