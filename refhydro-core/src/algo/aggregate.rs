//! Collapsing of degree-2 chains into reaches

use fixedbitset::FixedBitSet;
use geo::{Coord, LineString};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Attributes, EdgeId, HydroGraph, Length, LineFeature, NodeId, TopologyWarning,
    model::{AttributeValue, CLEABS_FIELD, NODE_A_FIELD, NODE_B_FIELD},
};

/// Bookkeeping fields never carried into reach attributes
pub const WORKING_FIELDS: [&str; 5] = [NODE_A_FIELD, NODE_B_FIELD, "GID", "LENGTH", "CATEGORY"];

/// Which edge of a chain provides the reach identifier and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeRule {
    /// Most upstream edge
    #[default]
    First,
    /// Most downstream edge
    Last,
    /// Longest edge, lowest index on equal lengths
    Longest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Fields copied onto reaches; `None` copies every non working field
    pub copy_fields: Option<Vec<String>>,
    pub merge: MergeRule,
    /// A change of this field's value between consecutive edges ends a reach
    pub category_field: Option<String>,
}

/// Maximal chain of edges between aggregation boundaries
#[derive(Debug, Clone, PartialEq)]
pub struct Reach {
    /// Constituent edges in flow order
    pub edges: Vec<EdgeId>,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub geometry: LineString<f64>,
    pub cleabs: String,
    pub attributes: Attributes,
    pub length: Length,
}

impl Reach {
    pub fn into_feature(self) -> LineFeature {
        LineFeature {
            fid: None,
            cleabs: self.cleabs,
            geometry: self.geometry,
            attributes: self.attributes,
        }
    }
}

/// Reaches of one aggregation run and the anomalies met
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub reaches: Vec<Reach>,
    pub warnings: Vec<TopologyWarning>,
}

impl Aggregation {
    pub fn into_features(self) -> Vec<LineFeature> {
        self.reaches.into_iter().map(Reach::into_feature).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReachAggregator {
    options: AggregateOptions,
}

impl ReachAggregator {
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Aggregator copying only `fields`
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AggregateOptions {
            copy_fields: Some(fields.into_iter().map(Into::into).collect()),
            ..AggregateOptions::default()
        })
    }

    pub fn aggregate(&self, graph: &HydroGraph) -> Aggregation {
        let mut visited = FixedBitSet::with_capacity(graph.edge_count());
        let mut aggregation = Aggregation::default();

        for edge in graph.edge_indices() {
            if visited.contains(edge.index()) || !self.is_boundary(graph, graph.from_node(edge)) {
                continue;
            }
            let chain = self.walk(graph, edge, &mut visited);
            aggregation.reaches.push(self.reach(graph, chain));
        }

        // Whatever is left lies on closed loops without a boundary node
        for edge in graph.edge_indices() {
            if visited.contains(edge.index()) {
                continue;
            }
            let cleabs = graph.feature(edge).cleabs.clone();
            warn!("Closed loop without confluence, cut at {cleabs}");
            aggregation
                .warnings
                .push(TopologyWarning::LoopCut { cleabs });
            let chain = self.walk(graph, edge, &mut visited);
            aggregation.reaches.push(self.reach(graph, chain));
        }

        info!(
            "Aggregated {} edges into {} reaches",
            graph.edge_count(),
            aggregation.reaches.len()
        );
        aggregation
    }

    fn walk(&self, graph: &HydroGraph, start: EdgeId, visited: &mut FixedBitSet) -> Vec<EdgeId> {
        let mut chain = vec![start];
        visited.insert(start.index());
        let mut node = graph.to_node(start);
        while !self.is_boundary(graph, node) {
            let outgoing = graph.outgoing(node);
            let &[next] = outgoing.as_slice() else {
                break;
            };
            if visited.put(next.index()) {
                break;
            }
            chain.push(next);
            node = graph.to_node(next);
        }
        chain
    }

    /// Junctions, sources and outlets end reaches, as do category changes
    fn is_boundary(&self, graph: &HydroGraph, node: NodeId) -> bool {
        let incoming = graph.incoming(node);
        let outgoing = graph.outgoing(node);
        let (&[up], &[down]) = (&incoming[..], &outgoing[..]) else {
            return true;
        };
        match &self.options.category_field {
            Some(field) => {
                graph.feature(up).attribute(field) != graph.feature(down).attribute(field)
            }
            None => false,
        }
    }

    fn reach(&self, graph: &HydroGraph, edges: Vec<EdgeId>) -> Reach {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        let mut length = 0.0;
        for &edge in &edges {
            let line = &graph.feature(edge).geometry;
            let skip = usize::from(!coords.is_empty());
            coords.extend(line.0.iter().skip(skip).copied());
            length += graph.edge_length(edge);
        }

        let source = match self.options.merge {
            MergeRule::First => edges[0],
            MergeRule::Last => edges[edges.len() - 1],
            MergeRule::Longest => edges
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    graph
                        .edge_length(a)
                        .total_cmp(&graph.edge_length(b))
                        .then_with(|| b.cmp(&a))
                })
                .unwrap_or(edges[0]),
        };
        let feature = graph.feature(source);

        Reach {
            from_node: graph.from_node(edges[0]),
            to_node: graph.to_node(edges[edges.len() - 1]),
            geometry: LineString::new(coords),
            cleabs: feature.cleabs.clone(),
            attributes: self.copied_attributes(&feature.attributes),
            length,
            edges,
        }
    }

    fn copied_attributes(&self, attributes: &Attributes) -> Attributes {
        let keep = |name: &str| {
            name != CLEABS_FIELD
                && !WORKING_FIELDS.contains(&name)
                && self
                    .options
                    .copy_fields
                    .as_ref()
                    .is_none_or(|fields| fields.iter().any(|f| f == name))
        };
        attributes
            .iter()
            .filter(|(name, _)| keep(name.as_str()))
            .map(|(name, value): (&String, &AttributeValue)| (name.clone(), value.clone()))
            .collect()
    }
}
