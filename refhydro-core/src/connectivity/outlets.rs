use geo::{Distance, Euclidean, Line, LineString, MultiPolygon, Point};
use log::{debug, info};
use rstar::{
    AABB, RTree,
    primitives::{GeomWithData, Line as SegmentGeom},
};

use crate::{HydroGraph, Layer, Length, LineFeature, NodeId};

/// Attribute naming the source layer of an outlet line
pub const OUTLET_SOURCE_FIELD: &str = "layer";

const COAST_SOURCE: &str = "limite_terre_mer";
const LAKE_SOURCE: &str = "plan_d_eau_line";
const BORDER_SOURCE: &str = "frontiere";

type IndexedSegment = GeomWithData<SegmentGeom<[f64; 2]>, usize>;

/// Valid network termini: coastline, lake shores and border crossings,
/// widened by a buffer distance.
///
/// Buffer membership is evaluated as "distance to the nearest outlet
/// segment is at most the buffer distance", over an R-tree of segments.
#[derive(Debug, Clone)]
pub struct OutletSet {
    lines: Vec<LineFeature>,
    buffer: Length,
    tree: RTree<IndexedSegment>,
}

impl OutletSet {
    pub fn from_lines(lines: Vec<LineFeature>, buffer: Length) -> Self {
        let segments: Vec<IndexedSegment> = lines
            .iter()
            .enumerate()
            .flat_map(|(index, feature)| {
                feature.geometry.lines().map(move |segment| {
                    GeomWithData::new(
                        SegmentGeom::new(
                            [segment.start.x, segment.start.y],
                            [segment.end.x, segment.end.y],
                        ),
                        index,
                    )
                })
            })
            .collect();
        debug!(
            "Indexed {} outlet segments from {} lines",
            segments.len(),
            lines.len()
        );

        Self {
            lines,
            buffer,
            tree: RTree::bulk_load(segments),
        }
    }

    /// Merges coastline lines, lake boundaries and border lines into one
    /// outlet set. Lake polygons are converted to their boundary rings.
    pub fn from_sources(
        coast: Vec<LineString<f64>>,
        lakes: &MultiPolygon<f64>,
        borders: Vec<LineString<f64>>,
        buffer: Length,
    ) -> Self {
        let lake_rings = lakes
            .iter()
            .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
            .cloned();

        let lines: Vec<LineFeature> = coast
            .into_iter()
            .map(|line| (COAST_SOURCE, line))
            .chain(lake_rings.map(|line| (LAKE_SOURCE, line)))
            .chain(borders.into_iter().map(|line| (BORDER_SOURCE, line)))
            .filter(|(_, line)| line.0.len() >= 2)
            .enumerate()
            .map(|(i, (source, line))| {
                LineFeature::new(format!("{source}.{}", i + 1), line)
                    .with_attribute(OUTLET_SOURCE_FIELD, source)
            })
            .collect();

        info!("Outlet set merged from {} lines", lines.len());
        Self::from_lines(lines, buffer)
    }

    /// Reloads a persisted outlet layer
    pub fn from_layer(layer: &Layer, buffer: Length) -> Self {
        Self::from_lines(layer.features().to_vec(), buffer)
    }

    pub fn buffer(&self) -> Length {
        self.buffer
    }

    pub fn lines(&self) -> &[LineFeature] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when `point` lies inside the buffered outlet geometry
    pub fn contains_point(&self, point: Point<f64>) -> bool {
        let squared = self.buffer * self.buffer;
        self.tree
            .locate_within_distance([point.x(), point.y()], squared)
            .next()
            .is_some()
    }

    /// True when any part of `line` lies inside the buffered outlet
    /// geometry
    pub fn intersects_line(&self, line: &LineString<f64>) -> bool {
        if line.0.len() == 1 {
            return self.contains_point(Point::from(line.0[0]));
        }
        line.lines().any(|segment| self.intersects_segment(segment))
    }

    fn intersects_segment(&self, segment: Line<f64>) -> bool {
        let b = self.buffer;
        let envelope = AABB::from_corners(
            [
                segment.start.x.min(segment.end.x) - b,
                segment.start.y.min(segment.end.y) - b,
            ],
            [
                segment.start.x.max(segment.end.x) + b,
                segment.start.y.max(segment.end.y) + b,
            ],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|candidate| {
                let geom = candidate.geom();
                let outlet = Line::new(geom.from, geom.to);
                Euclidean.distance(&segment, &outlet) <= b
            })
    }

    /// Graph nodes falling inside the buffered outlets, in index order
    pub fn seed_nodes(&self, graph: &HydroGraph) -> Vec<NodeId> {
        graph
            .node_indices()
            .filter(|&n| self.contains_point(graph.node(n).geometry))
            .collect()
    }

    /// Boundary rings of the lake polygons
    pub fn lake_lines(&self) -> Vec<LineFeature> {
        self.lines
            .iter()
            .filter(|f| {
                f.attribute(OUTLET_SOURCE_FIELD)
                    .and_then(|v| v.as_str())
                    .is_some_and(|source| source == LAKE_SOURCE)
            })
            .cloned()
            .collect()
    }

    /// Outlet lines as a persistable layer
    pub fn to_layer(&self, name: &str) -> Layer {
        Layer::from_features(name, self.lines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, line_string, polygon};

    fn coast() -> Vec<LineString<f64>> {
        vec![line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]]
    }

    #[test]
    fn points_within_buffer_are_contained() {
        let outlets = OutletSet::from_sources(coast(), &MultiPolygon::new(vec![]), vec![], 50.0);
        assert!(outlets.contains_point(Point::new(500.0, 49.0)));
        assert!(outlets.contains_point(Point::new(1030.0, 0.0)));
        assert!(!outlets.contains_point(Point::new(500.0, 51.0)));
    }

    #[test]
    fn lake_rings_and_borders_are_merged() {
        let lake = polygon![
            (x: 2000.0, y: 2000.0),
            (x: 2100.0, y: 2000.0),
            (x: 2100.0, y: 2100.0),
            (x: 2000.0, y: 2100.0),
        ];
        let border = vec![line_string![(x: 5000.0, y: 0.0), (x: 5000.0, y: 100.0)]];
        let outlets =
            OutletSet::from_sources(coast(), &MultiPolygon::new(vec![lake]), border, 50.0);
        assert_eq!(outlets.len(), 3);
        let sources: Vec<_> = outlets
            .lines()
            .iter()
            .filter_map(|f| f.attribute(OUTLET_SOURCE_FIELD).and_then(|v| v.as_str()))
            .collect();
        assert_eq!(sources, vec![COAST_SOURCE, LAKE_SOURCE, BORDER_SOURCE]);
        assert_eq!(outlets.lake_lines().len(), 1);
        assert!(outlets.contains_point(Point::new(2050.0, 2120.0)));
        assert!(outlets.contains_point(Point::new(4960.0, 50.0)));
    }

    #[test]
    fn line_intersection_uses_segment_distance() {
        let outlets = OutletSet::from_sources(coast(), &MultiPolygon::new(vec![]), vec![], 50.0);
        // Crosses the buffer without any vertex inside it
        let crossing = line_string![(x: 500.0, y: -200.0), (x: 500.0, y: 200.0)];
        let far = line_string![(x: 0.0, y: 100.0), (x: 1000.0, y: 100.0)];
        assert!(outlets.intersects_line(&crossing));
        assert!(!outlets.intersects_line(&far));
    }

    #[test]
    fn seed_nodes_come_from_buffer() {
        let features = vec![
            LineFeature::new("a", line_string![(x: 500.0, y: 500.0), (x: 500.0, y: 200.0)]),
            LineFeature::new("b", line_string![(x: 500.0, y: 200.0), (x: 500.0, y: 30.0)]),
        ];
        let (graph, _) = crate::network::NetworkGraphBuilder::default().build(&features);
        let outlets = OutletSet::from_sources(coast(), &MultiPolygon::new(vec![]), vec![], 50.0);
        let seeds = outlets.seed_nodes(&graph);
        assert_eq!(seeds.len(), 1);
        assert_eq!(
            graph.node(seeds[0]).geometry,
            Point::from(Coord { x: 500.0, y: 30.0 })
        );
    }
}
