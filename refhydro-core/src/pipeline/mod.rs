//! Named stages of the reference network workflow.
//!
//! Each stage reads its inputs from a [`LayerStore`](crate::loading::LayerStore),
//! writes its outputs back and returns a [`StageReport`] with the counts
//! of affected features.

mod config;
mod report;
mod stages;

pub use config::{LayerNames, PipelineConfig};
pub use report::StageReport;
pub use stages::{
    compute_orders, create_outlets, create_reference, create_width_network, remove_canals_auto,
    run_all, run_corrections,
};
