//! Automatic selection of artificial channels to remove

use log::info;

use crate::{
    EdgeId, HydroGraph, LineFeature, connectivity::OutletSet,
    connectivity::fix_network_connectivity,
};

/// `nature` values of artificial watercourses
pub const CANAL_NATURES: [&str; 4] = [
    "Canal",
    "Conduit forcé",
    "Conduit buse",
    "Ecoulement canalisé",
];

pub fn is_canal(feature: &LineFeature) -> bool {
    feature
        .nature()
        .is_some_and(|nature| CANAL_NATURES.contains(&nature))
}

/// Identifiers of canal edges that can be deleted without disconnecting
/// the natural network.
///
/// Natural edges and edges touching an outlet are kept; canal edges
/// needed to reconnect them downstream are kept too.
pub fn canal_deletion_set(graph: &HydroGraph, outlets: &OutletSet) -> Vec<String> {
    let subset: Vec<EdgeId> = graph
        .edge_indices()
        .filter(|&e| {
            let feature = graph.feature(e);
            !is_canal(feature) || outlets.intersects_line(&feature.geometry)
        })
        .collect();
    let kept = fix_network_connectivity(graph, &subset);

    let mut keep = vec![false; graph.edge_count()];
    for edge in kept {
        keep[edge.index()] = true;
    }
    let deleted: Vec<String> = graph
        .edge_indices()
        .filter(|e| !keep[e.index()])
        .map(|e| graph.feature(e).cleabs.clone())
        .collect();
    info!(
        "{} canal features selected for deletion out of {}",
        deleted.len(),
        graph.edge_count()
    );
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkGraphBuilder;
    use geo::{LineString, MultiPolygon, line_string};

    fn line(id: &str, nature: &str, coords: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(id, LineString::from(coords.to_vec()))
            .with_attribute(crate::model::NATURE_FIELD, nature)
    }

    #[test]
    fn canal_classification() {
        assert!(is_canal(&line("a", "Conduit forcé", &[(0.0, 0.0), (1.0, 0.0)])));
        assert!(!is_canal(&line("b", "Ecoulement naturel", &[(0.0, 0.0), (1.0, 0.0)])));
        assert!(!is_canal(&LineFeature::new("c", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])));
    }

    #[test]
    fn only_disconnectable_canals_are_deleted() {
        let features = vec![
            line("river", "Ecoulement naturel", &[(0.0, 1000.0), (0.0, 500.0)]),
            line("bridge", "Canal", &[(0.0, 500.0), (0.0, 200.0)]),
            line("mouth", "Ecoulement naturel", &[(0.0, 200.0), (0.0, 0.0)]),
            line("side", "Canal", &[(500.0, 800.0), (500.0, 600.0)]),
            line("estuary", "Canal", &[(300.0, 100.0), (300.0, -10.0)]),
        ];
        let (graph, _) = NetworkGraphBuilder::default().build(&features);
        let outlets = OutletSet::from_sources(
            vec![line_string![(x: -1000.0, y: 0.0), (x: 1000.0, y: 0.0)]],
            &MultiPolygon::new(vec![]),
            vec![],
            50.0,
        );
        assert_eq!(canal_deletion_set(&graph, &outlets), vec!["side".to_string()]);
    }
}
