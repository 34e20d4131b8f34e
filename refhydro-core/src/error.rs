use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load layer '{layer}': {reason}")]
    Load { layer: String, reason: String },
    #[error("Failed to write layer '{layer}': {reason}")]
    Write { layer: String, reason: String },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl Error {
    pub(crate) fn load(layer: &str, reason: impl Into<String>) -> Self {
        Error::Load {
            layer: layer.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(layer: &str, reason: impl Into<String>) -> Self {
        Error::Write {
            layer: layer.to_string(),
            reason: reason.into(),
        }
    }
}

/// Non-fatal anomaly found while processing. Logged where it is found
/// and carried in stage reports; processing continues with the
/// documented default resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyWarning {
    /// Feature with fewer than two vertices left out of the graph
    DegenerateGeometry { cleabs: String },
    /// Identical geometries collapsed to their first occurrence
    DuplicateGeometries { count: usize },
    /// Two upstream branches with the same cumulative length competed
    /// for the mainstem; the lowest edge index won
    HackTie { cleabs: String },
    /// Edges left without an order because they sit on, or drain
    /// through, a directed cycle
    CycleSkipped { edges: usize },
    /// Closed loop without junction, aggregated from an arbitrary edge
    LoopCut { cleabs: String },
    /// Correction identifier with no matching target feature
    UnmatchedCorrection { cleabs: String },
}

impl std::fmt::Display for TopologyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyWarning::DegenerateGeometry { cleabs } => {
                write!(f, "degenerate geometry excluded: {cleabs}")
            }
            TopologyWarning::DuplicateGeometries { count } => {
                write!(f, "{count} duplicate geometries collapsed")
            }
            TopologyWarning::HackTie { cleabs } => {
                write!(f, "mainstem tie resolved by edge index at {cleabs}")
            }
            TopologyWarning::CycleSkipped { edges } => {
                write!(f, "{edges} edges on or below a cycle left unordered")
            }
            TopologyWarning::LoopCut { cleabs } => {
                write!(f, "closed loop cut at {cleabs}")
            }
            TopologyWarning::UnmatchedCorrection { cleabs } => {
                write!(f, "correction {cleabs} matches no feature")
            }
        }
    }
}
