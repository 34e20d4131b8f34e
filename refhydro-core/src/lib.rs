//! Reference hydrographic network construction.
//!
//! Turns a manually annotated stream centerline layer into a directed,
//! connected drainage network rooted at verified outlets, then derives
//! stream order attributes and aggregates edges between confluences.

pub mod algo;
pub mod connectivity;
pub mod correction;
pub mod error;
pub mod loading;
pub mod model;
pub mod network;
pub mod pipeline;
pub mod prelude;

pub use error::{Error, TopologyWarning};
pub use model::{AttributeValue, Attributes, HydroGraph, Layer, LineFeature};

/// Index of a node in a [`HydroGraph`]
pub type NodeId = petgraph::graph::NodeIndex;
/// Index of an edge in a [`HydroGraph`]
pub type EdgeId = petgraph::graph::EdgeIndex;
/// Planar length in the units of the layer coordinate reference system
pub type Length = f64;

/// Grid resolution used to snap line endpoints onto shared nodes
pub const DEFAULT_QUANTIZATION: f64 = 1e8;
/// Tolerance around outlet geometries when selecting seed nodes
pub const DEFAULT_BUFFER_DISTANCE: Length = 50.0;
/// Maximum length of a first order tributary removed by pruning
pub const DEFAULT_PRUNE_LENGTH: Length = 500.0;
/// Minimum Strahler order of the receiving stream for pruning
pub const DEFAULT_PRUNE_MIN_ORDER: u32 = 3;
/// Growth applied to the dissolved water surfaces before the width filter
pub const DEFAULT_SURFACE_BUFFER: Length = 10.0;
