use geo::{LineString, MultiPolygon};

use crate::{
    Error,
    model::{Layer, NodeRecord},
};

/// How a layer is written to its package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Create the package if needed, then write the layer
    Create,
    /// Overwrite the layer inside an existing package
    Update,
}

/// Storage of named layers.
///
/// Loading validates the layer: a missing layer or a geometry of the
/// wrong kind is a [`Error::Load`]. Saving overwrites only the named
/// layer; an `Update` on a package that does not exist yet falls back to
/// `Create`, and the mode actually used is returned.
pub trait LayerStore {
    /// Line features carrying a `cleabs` identifier
    fn load_layer(&self, name: &str) -> Result<Layer, Error>;

    /// Plain line geometries, identifiers not required
    fn load_lines(&self, name: &str) -> Result<Vec<LineString<f64>>, Error>;

    /// Polygon geometries merged into one multipolygon
    fn load_polygons(&self, name: &str) -> Result<MultiPolygon<f64>, Error>;

    fn save_layer(&mut self, layer: &Layer, name: &str, mode: SaveMode)
    -> Result<SaveMode, Error>;

    /// Point layer of network nodes with their degrees
    fn save_nodes(&mut self, nodes: &[NodeRecord], name: &str) -> Result<SaveMode, Error>;

    fn has_layer(&self, name: &str) -> bool;
}
