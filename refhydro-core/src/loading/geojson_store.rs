use std::{
    fs,
    path::{Path, PathBuf},
};

use geo::{LineString, MultiPolygon};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use log::{debug, info};
use serde_json::{Value as JsonValue, json};

use super::{LayerStore, SaveMode};
use crate::{
    Error,
    model::{
        AttributeValue, Attributes, Layer, LineFeature, NodeRecord, feature::CLEABS_FIELD,
    },
};

const FID_FIELD: &str = "fid";

/// Layer package stored as a directory holding one `<layer>.geojson`
/// file per layer.
#[derive(Debug, Clone)]
pub struct GeoJsonStore {
    root: PathBuf,
    crs: Option<String>,
}

impl GeoJsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            crs: None,
        }
    }

    /// Tags written layers with a named CRS member (e.g. `EPSG:2154`)
    #[must_use]
    pub fn with_crs(mut self, crs: &str) -> Self {
        self.crs = Some(crs.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layer_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.geojson"))
    }

    fn read_collection(&self, name: &str) -> Result<FeatureCollection, Error> {
        let path = self.layer_path(name);
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::load(name, format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text).map_err(|e| Error::load(name, e.to_string()))
    }

    fn geometries(&self, name: &str) -> Result<Vec<(geo::Geometry<f64>, Option<JsonObject>)>, Error> {
        self.read_collection(name)?
            .features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| {
                let geometry = feature
                    .geometry
                    .ok_or_else(|| Error::load(name, format!("feature {idx} has no geometry")))?;
                let geometry = geo::Geometry::<f64>::try_from(geometry)
                    .map_err(|e| Error::load(name, format!("feature {idx}: {e}")))?;
                Ok((geometry, feature.properties))
            })
            .collect()
    }

    fn prepare_package(&self, name: &str, mode: SaveMode) -> Result<SaveMode, Error> {
        match mode {
            SaveMode::Update if self.root.is_dir() => Ok(SaveMode::Update),
            SaveMode::Update | SaveMode::Create => {
                if mode == SaveMode::Update {
                    info!(
                        "Package {} does not exist, switching to create mode",
                        self.root.display()
                    );
                }
                fs::create_dir_all(&self.root)
                    .map_err(|e| Error::write(name, format!("{}: {e}", self.root.display())))?;
                Ok(SaveMode::Create)
            }
        }
    }

    fn write_features(
        &self,
        name: &str,
        features: Vec<Feature>,
        mode: SaveMode,
    ) -> Result<SaveMode, Error> {
        let effective = self.prepare_package(name, mode)?;
        let foreign_members = self.crs.as_ref().map(|crs| {
            let mut members = JsonObject::new();
            members.insert("name".to_string(), JsonValue::String(name.to_string()));
            members.insert(
                "crs".to_string(),
                json!({ "type": "name", "properties": { "name": crs } }),
            );
            members
        });
        let collection = FeatureCollection {
            features,
            bbox: None,
            foreign_members,
        };
        let text = serde_json::to_string(&collection)
            .map_err(|e| Error::write(name, e.to_string()))?;

        // Atomic replace: sibling temp file, then rename
        let path = self.layer_path(name);
        let tmp = path.with_extension("geojson.tmp");
        fs::write(&tmp, text).map_err(|e| Error::write(name, format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| Error::write(name, format!("{}: {e}", path.display())))?;
        debug!("Layer {name} written to {}", path.display());
        Ok(effective)
    }
}

fn into_line(geometry: geo::Geometry<f64>) -> Option<LineString<f64>> {
    match geometry {
        geo::Geometry::LineString(line) => Some(line),
        geo::Geometry::MultiLineString(mut lines) if lines.0.len() == 1 => lines.0.pop(),
        _ => None,
    }
}

fn line_feature(
    name: &str,
    idx: usize,
    geometry: geo::Geometry<f64>,
    properties: Option<JsonObject>,
) -> Result<LineFeature, Error> {
    let geometry = into_line(geometry)
        .ok_or_else(|| Error::load(name, format!("feature {idx} is not a single line")))?;
    let mut properties = properties.unwrap_or_default();
    let cleabs = match properties.remove(CLEABS_FIELD) {
        Some(JsonValue::String(s)) if !s.is_empty() => s,
        _ => return Err(Error::load(name, format!("feature {idx} has no cleabs"))),
    };
    let fid = properties.remove(FID_FIELD).and_then(|v| v.as_u64());
    let attributes: Attributes = properties
        .iter()
        .map(|(k, v)| (k.clone(), AttributeValue::from(v)))
        .collect();
    Ok(LineFeature {
        fid,
        cleabs,
        geometry,
        attributes,
    })
}

impl LayerStore for GeoJsonStore {
    fn load_layer(&self, name: &str) -> Result<Layer, Error> {
        let features = self
            .geometries(name)?
            .into_iter()
            .enumerate()
            .map(|(idx, (geometry, properties))| line_feature(name, idx, geometry, properties))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Layer {name} loaded: {} features", features.len());
        Ok(Layer::from_features(name, features))
    }

    fn load_lines(&self, name: &str) -> Result<Vec<LineString<f64>>, Error> {
        self.geometries(name)?
            .into_iter()
            .enumerate()
            .map(|(idx, (geometry, _))| {
                into_line(geometry)
                    .ok_or_else(|| Error::load(name, format!("feature {idx} is not a single line")))
            })
            .collect()
    }

    fn load_polygons(&self, name: &str) -> Result<MultiPolygon<f64>, Error> {
        let mut polygons = Vec::new();
        for (idx, (geometry, _)) in self.geometries(name)?.into_iter().enumerate() {
            match geometry {
                geo::Geometry::Polygon(polygon) => polygons.push(polygon),
                geo::Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
                _ => {
                    return Err(Error::load(name, format!("feature {idx} is not a polygon")));
                }
            }
        }
        Ok(MultiPolygon::new(polygons))
    }

    fn save_layer(
        &mut self,
        layer: &Layer,
        name: &str,
        mode: SaveMode,
    ) -> Result<SaveMode, Error> {
        let features = layer
            .iter()
            .map(|feature| {
                let mut properties = JsonObject::new();
                if let Some(fid) = feature.fid {
                    properties.insert(FID_FIELD.to_string(), JsonValue::from(fid));
                }
                properties.insert(
                    CLEABS_FIELD.to_string(),
                    JsonValue::String(feature.cleabs.clone()),
                );
                for (key, value) in &feature.attributes {
                    properties.insert(key.clone(), JsonValue::from(value));
                }
                let value = json!({
                    "type": "Feature",
                    "geometry": Geometry::new(GeoJsonValue::from(&feature.geometry)),
                    "properties": properties,
                });
                serde_json::from_value::<Feature>(value).map_err(|e| Error::write(name, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let effective = self.write_features(name, features, mode)?;
        info!(
            "Layer {name} saved ({} features, {effective:?})",
            layer.len()
        );
        Ok(effective)
    }

    fn save_nodes(
        &mut self,
        nodes: &[NodeRecord],
        name: &str,
    ) -> Result<SaveMode, Error> {
        let features = nodes
            .iter()
            .map(|node| {
                let value = json!({
                    "type": "Feature",
                    "geometry": Geometry::new(GeoJsonValue::from(&node.geometry)),
                    "properties": {
                        "GID": node.gid,
                        "IN_DEGREE": node.in_degree,
                        "OUT_DEGREE": node.out_degree,
                    }
                });
                serde_json::from_value::<Feature>(value).map_err(|e| Error::write(name, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.write_features(name, features, SaveMode::Update)
    }

    fn has_layer(&self, name: &str) -> bool {
        self.layer_path(name).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn missing_layer_is_load_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = GeoJsonStore::new(dir.path());
        assert!(matches!(
            store.load_layer("absent"),
            Err(Error::Load { .. })
        ));
    }

    #[test]
    fn update_on_missing_package_creates_it() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = GeoJsonStore::new(dir.path().join("package")).with_crs("EPSG:2154");
        let layer = Layer::from_features(
            "troncon",
            vec![
                LineFeature::new("A", line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 2.0)])
                    .with_attribute("nature", "Canal"),
            ],
        );
        let mode = store
            .save_layer(&layer, "troncon", SaveMode::Update)
            .expect("saved");
        assert_eq!(mode, SaveMode::Create);
        let mode = store
            .save_layer(&layer, "troncon", SaveMode::Update)
            .expect("saved");
        assert_eq!(mode, SaveMode::Update);

        let loaded = store.load_layer("troncon").expect("loaded");
        assert_eq!(loaded.len(), 1);
        let feature = &loaded.features()[0];
        assert_eq!(feature.cleabs, "A");
        assert_eq!(feature.fid, Some(1));
        assert_eq!(feature.nature(), Some("Canal"));
        assert_eq!(feature.geometry, layer.features()[0].geometry);
    }

    #[test]
    fn features_without_cleabs_fail_validation() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = GeoJsonStore::new(dir.path());
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{}}
        ]}"#;
        fs::write(store.layer_path("lines"), text).expect("write");
        assert!(matches!(store.load_layer("lines"), Err(Error::Load { .. })));
        assert_eq!(store.load_lines("lines").expect("lines").len(), 1);
        assert!(store.load_polygons("lines").is_err());
    }
}
