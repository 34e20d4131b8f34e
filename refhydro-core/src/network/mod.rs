//! Graph construction from independently digitized line features

mod builder;
mod quantize;

pub use builder::{BuildReport, NetworkGraphBuilder, remove_duplicate_geometries};
pub use quantize::Quantizer;
