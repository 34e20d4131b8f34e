//! Outlet geometries and connectivity of the network with respect to them

mod outlets;
mod principal;
mod repair;
mod tracer;

pub use outlets::{OUTLET_SOURCE_FIELD, OutletSet};
pub use principal::principal_stem;
pub use repair::fix_network_connectivity;
pub use tracer::{ConnectivityTracer, Direction, TraceResult};
