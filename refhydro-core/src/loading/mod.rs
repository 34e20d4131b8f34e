//! This module is responsible for reading and writing named layers:
//! the get/put contract the pipeline stages run against.

mod geojson_store;
mod idlist;
mod memory;
mod store;

pub use geojson_store::GeoJsonStore;
pub use idlist::read_id_list;
pub use memory::MemoryStore;
pub use store::{LayerStore, SaveMode};
