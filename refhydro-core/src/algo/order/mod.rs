//! Distance to outlet, stream orders and order based pruning

mod hack;
mod measure;
mod prune;
mod strahler;
mod topo;

pub use hack::{HackOrders, hack_order};
pub use measure::{Measure, measure_from_outlet};
pub use prune::{PruneRule, prune_small_tributaries};
pub use strahler::strahler_order;

use log::info;

use crate::{HydroGraph, LineFeature, NodeId, TopologyWarning, model::AttributeValue};

pub const MEASURE_FIELD: &str = "MEASURE";
pub const STRAHLER_FIELD: &str = "STRAHLER";
pub const HACK_FIELD: &str = "HACK";
pub const MAINSTEM_FIELD: &str = "MAINSTEM";

/// Per-edge order attributes of one graph
#[derive(Debug, Clone, Default)]
pub struct StreamOrders {
    pub measure: Measure,
    pub strahler: Vec<Option<u32>>,
    pub hack: HackOrders,
    pub warnings: Vec<TopologyWarning>,
}

impl StreamOrders {
    /// Copies of the graph features carrying `MEASURE`, `STRAHLER`,
    /// `HACK` and `MAINSTEM`; unassigned values are written as null.
    pub fn annotate(&self, graph: &HydroGraph) -> Vec<LineFeature> {
        graph
            .edge_indices()
            .map(|e| {
                let i = e.index();
                let mut feature = graph.feature(e).clone();
                feature.set_attribute(
                    MEASURE_FIELD,
                    self.measure.edge(e).map_or(AttributeValue::Null, AttributeValue::Real),
                );
                feature.set_attribute(STRAHLER_FIELD, optional_int(self.strahler[i]));
                feature.set_attribute(HACK_FIELD, optional_int(self.hack.order[i]));
                feature.set_attribute(
                    MAINSTEM_FIELD,
                    self.hack.mainstem[i]
                        .clone()
                        .map_or(AttributeValue::Null, AttributeValue::Text),
                );
                feature
            })
            .collect()
    }
}

fn optional_int(value: Option<u32>) -> AttributeValue {
    value.map_or(AttributeValue::Null, |v| AttributeValue::Int(i64::from(v)))
}

/// Computes measures and orders, then prunes small tributaries
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOrderCalculator {
    rule: PruneRule,
}

impl StreamOrderCalculator {
    pub fn new(rule: PruneRule) -> Self {
        Self { rule }
    }

    pub fn compute(&self, graph: &HydroGraph, outlets: &[NodeId]) -> StreamOrders {
        let measure = measure_from_outlet(graph, outlets);
        let (strahler, mut warnings) = strahler_order(graph);
        let hack = hack_order(graph, &measure);
        warnings.extend(hack.warnings.iter().cloned());
        info!(
            "Stream orders computed: max Strahler {}, max Hack {}",
            strahler.iter().flatten().max().copied().unwrap_or(0),
            hack.order.iter().flatten().max().copied().unwrap_or(0)
        );
        StreamOrders {
            measure,
            strahler,
            hack,
            warnings,
        }
    }

    pub fn prune(&self, graph: &HydroGraph, orders: &StreamOrders) -> (HydroGraph, Vec<String>) {
        prune_small_tributaries(graph, &orders.strahler, &self.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EdgeId, network::NetworkGraphBuilder};
    use geo::{Coord, LineString};

    #[test]
    fn annotate_writes_all_order_fields() {
        let features = vec![
            LineFeature::new("a", LineString::from(vec![(0.0, 100.0), (0.0, 0.0)])),
            LineFeature::new("lost", LineString::from(vec![(50.0, 50.0), (60.0, 60.0)])),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let outlet = graph.node_at(Coord { x: 0.0, y: 0.0 }).expect("outlet");
        let orders = StreamOrderCalculator::default().compute(&graph, &[outlet]);
        let annotated = orders.annotate(&graph);

        let a = &annotated[EdgeId::new(0).index()];
        assert_eq!(a.attribute(MEASURE_FIELD), Some(&AttributeValue::Real(100.0)));
        assert_eq!(a.attribute(STRAHLER_FIELD), Some(&AttributeValue::Int(1)));
        assert_eq!(a.attribute(HACK_FIELD), Some(&AttributeValue::Int(1)));
        assert_eq!(a.attribute(MAINSTEM_FIELD), Some(&AttributeValue::from("a")));

        let lost = &annotated[1];
        assert_eq!(lost.attribute(MEASURE_FIELD), Some(&AttributeValue::Null));
        assert_eq!(lost.attribute(HACK_FIELD), Some(&AttributeValue::Null));
        assert_eq!(lost.attribute(STRAHLER_FIELD), Some(&AttributeValue::Int(1)));
    }
}
