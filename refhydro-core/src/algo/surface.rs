//! Selection of edges lying inside water surfaces

use geo::{BooleanOps, Buffer, MultiLineString, MultiPolygon, unary_union};
use log::{debug, info};
use rayon::prelude::*;

use crate::{EdgeId, HydroGraph, Length, model::feature::planar_length};

/// Merges overlapping surface polygons into one area, then grows it by
/// `buffer`
pub fn dissolve_surfaces(surfaces: &MultiPolygon<f64>, buffer: Length) -> MultiPolygon<f64> {
    let merged = unary_union(&surfaces.0);
    debug!(
        "Dissolved {} surface polygons into {}",
        surfaces.0.len(),
        merged.0.len()
    );
    if buffer > 0.0 {
        merged.buffer(buffer)
    } else {
        merged
    }
}

/// Edges with at least `min_percent` of their length inside the
/// dissolved and buffered `surfaces`, ascending. Zero-length edges are
/// never selected.
pub fn select_within(
    graph: &HydroGraph,
    surfaces: &MultiPolygon<f64>,
    buffer: Length,
    min_percent: f64,
) -> Vec<EdgeId> {
    let area = dissolve_surfaces(surfaces, buffer);
    let edges: Vec<EdgeId> = graph.edge_indices().collect();
    let selected: Vec<EdgeId> = edges
        .into_par_iter()
        .filter(|&edge| {
            let total = graph.edge_length(edge);
            if total <= 0.0 {
                return false;
            }
            let line = MultiLineString::new(vec![graph.feature(edge).geometry.clone()]);
            let clipped = area.clip(&line, false);
            let inside: f64 = clipped.iter().map(planar_length).sum();
            inside / total * 100.0 + 1e-9 >= min_percent
        })
        .collect();
    info!(
        "{} of {} edges have at least {min_percent}% of their length inside surfaces",
        selected.len(),
        graph.edge_count()
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineFeature, network::NetworkGraphBuilder};
    use geo::{LineString, Polygon, polygon};

    fn square(xmin: f64, xmax: f64) -> Polygon<f64> {
        polygon![
            (x: xmin, y: -10.0),
            (x: xmax, y: -10.0),
            (x: xmax, y: 10.0),
            (x: xmin, y: 10.0),
        ]
    }

    fn graph_of(lines: &[(&str, [(f64, f64); 2])]) -> HydroGraph {
        let features: Vec<LineFeature> = lines
            .iter()
            .map(|(id, coords)| LineFeature::new(*id, LineString::from(coords.to_vec())))
            .collect();
        NetworkGraphBuilder::default().build(&features).0
    }

    #[test]
    fn partial_overlap_is_measured_by_length() {
        let surface = MultiPolygon::new(vec![square(0.0, 100.0)]);
        let graph = graph_of(&[
            ("inside", [(10.0, 0.0), (90.0, 0.0)]),
            ("half", [(50.0, 5.0), (150.0, 5.0)]),
            ("outside", [(200.0, 0.0), (300.0, 0.0)]),
        ]);

        assert_eq!(
            select_within(&graph, &surface, 0.0, 100.0),
            vec![EdgeId::new(0)]
        );
        assert_eq!(
            select_within(&graph, &surface, 0.0, 50.0),
            vec![EdgeId::new(0), EdgeId::new(1)]
        );
    }

    #[test]
    fn overlapping_surfaces_count_once() {
        let surfaces = MultiPolygon::new(vec![square(0.0, 100.0), square(50.0, 150.0)]);
        let graph = graph_of(&[
            ("overlap", [(60.0, 0.0), (90.0, 0.0)]),
            ("across", [(10.0, 0.0), (140.0, 0.0)]),
        ]);
        assert_eq!(
            select_within(&graph, &surfaces, 0.0, 100.0),
            vec![EdgeId::new(0), EdgeId::new(1)]
        );
    }

    #[test]
    fn buffer_reaches_lines_along_the_bank() {
        let surfaces = MultiPolygon::new(vec![square(0.0, 100.0)]);
        let graph = graph_of(&[("bank", [(10.0, 15.0), (90.0, 15.0)])]);
        assert!(select_within(&graph, &surfaces, 0.0, 100.0).is_empty());
        assert_eq!(
            select_within(&graph, &surfaces, 10.0, 100.0),
            vec![EdgeId::new(0)]
        );
    }
}
