use std::collections::VecDeque;

use log::warn;

use super::{Measure, topo::upstream_first};
use crate::{EdgeId, HydroGraph, Length, TopologyWarning};

const LENGTH_EPSILON: Length = 1e-9;

/// Hack order and mainstem of every edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HackOrders {
    /// 1 on the mainstem of an outlet, n + 1 on a stream joining an
    /// order-n stream
    pub order: Vec<Option<u32>>,
    /// Identifier of the outlet edge of the order-1 stream the edge
    /// ultimately drains into
    pub mainstem: Vec<Option<String>>,
    pub warnings: Vec<TopologyWarning>,
}

/// Longest flow path above and including each edge
fn upstream_lengths(graph: &HydroGraph) -> (Vec<Option<Length>>, usize) {
    let (order, skipped) = upstream_first(graph);
    let mut lengths: Vec<Option<Length>> = vec![None; graph.edge_count()];
    for edge in order {
        let above = graph
            .incoming(graph.from_node(edge))
            .into_iter()
            .filter_map(|e| lengths[e.index()])
            .fold(0.0, Length::max);
        lengths[edge.index()] = Some(above + graph.edge_length(edge));
    }
    (lengths, skipped.len())
}

/// Walks upstream from every edge ending on an outlet. At each confluence
/// the branch with the greatest upstream length continues the receiving
/// stream; the others start a new stream one order higher. Equal lengths
/// go to the lowest edge index and are reported as ties.
pub fn hack_order(graph: &HydroGraph, measure: &Measure) -> HackOrders {
    let (upstream, skipped) = upstream_lengths(graph);
    let mut result = HackOrders {
        order: vec![None; graph.edge_count()],
        mainstem: vec![None; graph.edge_count()],
        warnings: Vec::new(),
    };
    let mut queue = VecDeque::new();

    for edge in graph.edge_indices() {
        if upstream[edge.index()].is_some() && measure.is_terminal(graph, edge) {
            result.order[edge.index()] = Some(1);
            result.mainstem[edge.index()] = Some(graph.feature(edge).cleabs.clone());
            queue.push_back(edge);
        }
    }

    while let Some(edge) = queue.pop_front() {
        let (Some(order), Some(mainstem)) = (
            result.order[edge.index()],
            result.mainstem[edge.index()].clone(),
        ) else {
            continue;
        };
        let mut branches: Vec<(EdgeId, Length)> = graph
            .incoming(graph.from_node(edge))
            .into_iter()
            .filter(|e| result.order[e.index()].is_none())
            .filter_map(|e| upstream[e.index()].map(|len| (e, len)))
            .collect();
        if branches.is_empty() {
            continue;
        }
        branches.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if branches.len() >= 2 && (branches[0].1 - branches[1].1).abs() <= LENGTH_EPSILON {
            let cleabs = graph.feature(branches[0].0).cleabs.clone();
            warn!("Hack order tie above {mainstem}, continuing with {cleabs}");
            result.warnings.push(TopologyWarning::HackTie { cleabs });
        }

        for (i, (branch, _)) in branches.into_iter().enumerate() {
            result.order[branch.index()] = Some(if i == 0 { order } else { order + 1 });
            result.mainstem[branch.index()] = Some(mainstem.clone());
            queue.push_back(branch);
        }
    }

    if skipped > 0 {
        warn!("Hack order skipped {skipped} edges on or fed only by a cycle");
        result
            .warnings
            .push(TopologyWarning::CycleSkipped { edges: skipped });
    }
    result
}
