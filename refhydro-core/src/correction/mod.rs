//! Scripted corrective edits of the working stream layer
//!
//! Each operation is keyed by the stable `cleabs` identifier and runs
//! inside one edit transaction of the target layer.

mod applier;
pub mod canal;

pub use applier::{CorrectionApplier, CorrectionOp, CorrectionReport, CorrectionSet};
pub use canal::{CANAL_NATURES, canal_deletion_set, is_canal};
