//! Data model for the hydrographic network
//!
//! Line features and the layers that own them, and the node-indexed
//! graph built from a feature collection.

pub mod feature;
pub mod layer;
pub mod network;

pub use feature::{
    AttributeValue, Attributes, CLEABS_FIELD, LineFeature, NATURE_FIELD, NodeRecord,
};
pub use layer::{Layer, LayerEdit};
pub use network::{HydroEdge, HydroGraph, HydroNode, NODE_A_FIELD, NODE_B_FIELD, NodeKey};
