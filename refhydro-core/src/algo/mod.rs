pub mod aggregate;
pub(crate) mod dijkstra;
pub mod order;
pub mod surface;

pub use aggregate::{
    AggregateOptions, Aggregation, MergeRule, Reach, ReachAggregator, WORKING_FIELDS,
};
pub use order::{
    HACK_FIELD, MAINSTEM_FIELD, MEASURE_FIELD, PruneRule, STRAHLER_FIELD, StreamOrderCalculator,
    StreamOrders, hack_order, measure_from_outlet, prune_small_tributaries, strahler_order,
};
pub use surface::select_within;
