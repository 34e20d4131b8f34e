pub use crate::DEFAULT_BUFFER_DISTANCE;
pub use crate::DEFAULT_QUANTIZATION;

// Re-export key components
pub use crate::algo::{
    AggregateOptions, MergeRule, PruneRule, Reach, ReachAggregator, StreamOrderCalculator,
    StreamOrders,
};
pub use crate::connectivity::{ConnectivityTracer, Direction, OutletSet};
pub use crate::correction::{CorrectionApplier, CorrectionOp, CorrectionReport, CorrectionSet};
pub use crate::loading::{GeoJsonStore, LayerStore, MemoryStore, SaveMode};
pub use crate::model::{HydroGraph, Layer, LineFeature};
pub use crate::network::NetworkGraphBuilder;
pub use crate::pipeline::{PipelineConfig, StageReport};

// Core types for the network graph
pub use crate::EdgeId;
pub use crate::Length; // layer CRS units
pub use crate::NodeId;
