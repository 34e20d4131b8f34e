use geo::{LineString, MultiPolygon};
use hashbrown::HashMap;

use super::{LayerStore, SaveMode};
use crate::{
    Error,
    model::{Layer, NodeRecord},
};

#[derive(Debug, Clone)]
enum StoredLayer {
    Lines(Layer),
    Polygons(MultiPolygon<f64>),
    Nodes(Vec<NodeRecord>),
}

/// In-process layer store, used to chain stages without touching disk
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    layers: HashMap<String, StoredLayer>,
    created: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_layer(&mut self, name: &str, layer: Layer) {
        self.created = true;
        self.layers
            .insert(name.to_string(), StoredLayer::Lines(layer));
    }

    pub fn insert_polygons(&mut self, name: &str, polygons: MultiPolygon<f64>) {
        self.created = true;
        self.layers
            .insert(name.to_string(), StoredLayer::Polygons(polygons));
    }

    pub fn nodes(&self, name: &str) -> Option<&[NodeRecord]> {
        match self.layers.get(name) {
            Some(StoredLayer::Nodes(nodes)) => Some(nodes),
            _ => None,
        }
    }
}

impl LayerStore for MemoryStore {
    fn load_layer(&self, name: &str) -> Result<Layer, Error> {
        match self.layers.get(name) {
            Some(StoredLayer::Lines(layer)) => {
                if let Some(f) = layer.iter().find(|f| f.cleabs.is_empty()) {
                    return Err(Error::load(
                        name,
                        format!("feature {:?} has no cleabs", f.fid),
                    ));
                }
                Ok(layer.clone())
            }
            Some(_) => Err(Error::load(name, "not a line layer")),
            None => Err(Error::load(name, "layer not found")),
        }
    }

    fn load_lines(&self, name: &str) -> Result<Vec<LineString<f64>>, Error> {
        match self.layers.get(name) {
            Some(StoredLayer::Lines(layer)) => {
                Ok(layer.iter().map(|f| f.geometry.clone()).collect())
            }
            Some(_) => Err(Error::load(name, "not a line layer")),
            None => Err(Error::load(name, "layer not found")),
        }
    }

    fn load_polygons(&self, name: &str) -> Result<MultiPolygon<f64>, Error> {
        match self.layers.get(name) {
            Some(StoredLayer::Polygons(polygons)) => Ok(polygons.clone()),
            Some(_) => Err(Error::load(name, "not a polygon layer")),
            None => Err(Error::load(name, "layer not found")),
        }
    }

    fn save_layer(
        &mut self,
        layer: &Layer,
        name: &str,
        mode: SaveMode,
    ) -> Result<SaveMode, Error> {
        let effective = if mode == SaveMode::Update && !self.created {
            SaveMode::Create
        } else {
            mode
        };
        let stored = Layer::from_features(name, layer.features().to_vec());
        self.insert_layer(name, stored);
        Ok(effective)
    }

    fn save_nodes(&mut self, nodes: &[NodeRecord], name: &str) -> Result<SaveMode, Error> {
        let effective = if self.created {
            SaveMode::Update
        } else {
            SaveMode::Create
        };
        self.created = true;
        self.layers
            .insert(name.to_string(), StoredLayer::Nodes(nodes.to_vec()));
        Ok(effective)
    }

    fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }
}
