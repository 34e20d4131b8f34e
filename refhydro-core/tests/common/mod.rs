#![allow(dead_code)]

use geo::{LineString, MultiPolygon, line_string, polygon};
use refhydro_core::{
    Layer, LineFeature,
    loading::MemoryStore,
    model::NATURE_FIELD,
    pipeline::PipelineConfig,
};

pub fn line(id: &str, coords: &[(f64, f64)]) -> LineFeature {
    LineFeature::new(id, LineString::from(coords.to_vec()))
        .with_attribute(NATURE_FIELD, "Ecoulement naturel")
}

pub fn canal(id: &str, coords: &[(f64, f64)]) -> LineFeature {
    LineFeature::new(id, LineString::from(coords.to_vec())).with_attribute(NATURE_FIELD, "Canal")
}

/// Working layer as digitized: a river reaching the coast at y = 0 with
/// a tributary, one reach drawn upstream, one missing, one canal and an
/// isolated pond outlet.
///
/// ```text
///  (0,3000) src
///     |  a
///  (0,2000) ---- t (800,2000)
///     |  b (drawn reversed)
///  (0,1000) ---- canal (600,1000)
///     |  c (missing)
///  (0,0) coast
/// ```
pub fn working_layer() -> Layer {
    Layer::from_features(
        "troncon_hydrographique_cours_d_eau_corr",
        vec![
            line("a", &[(0.0, 3000.0), (0.0, 2000.0)]),
            line("b", &[(0.0, 1000.0), (0.0, 2000.0)]),
            line("t", &[(800.0, 2000.0), (0.0, 2000.0)]),
            canal("canal", &[(600.0, 1000.0), (0.0, 1000.0)]),
            line("pond", &[(5000.0, 5000.0), (5100.0, 5100.0)]),
        ],
    )
}

/// Correction package matching [`working_layer`]
pub fn inputs() -> MemoryStore {
    let config = PipelineConfig::default();
    let names = &config.layers;
    let mut store = MemoryStore::new();
    store.insert_layer(
        &names.corr_connection_and_direction,
        Layer::new(&names.corr_connection_and_direction),
    );
    store.insert_layer(
        &names.corr_connection,
        Layer::from_features(
            &names.corr_connection,
            vec![
                line("c", &[(0.0, 1000.0), (0.0, 0.0)]),
                line("a", &[(0.0, 3000.0), (0.0, 2000.0)]),
            ],
        ),
    );
    store.insert_layer(
        &names.corr_direction,
        Layer::from_features(
            &names.corr_direction,
            vec![line("b", &[(0.0, 1000.0), (0.0, 2000.0)])],
        ),
    );
    store.insert_layer(&names.corr_geometry, Layer::new(&names.corr_geometry));
    store.insert_layer(
        &names.corr_canal,
        Layer::from_features(
            &names.corr_canal,
            vec![canal("canal", &[(600.0, 1000.0), (0.0, 1000.0)])],
        ),
    );
    store.insert_layer(
        &names.coastline,
        Layer::from_features(
            &names.coastline,
            vec![LineFeature::new(
                "coast",
                line_string![(x: -5000.0, y: -20.0), (x: 5000.0, y: -20.0)],
            )],
        ),
    );
    store.insert_layer(&names.borders, Layer::new(&names.borders));
    store.insert_polygons(
        &names.lakes,
        MultiPolygon::new(vec![polygon![
            (x: 9000.0, y: 9000.0),
            (x: 9500.0, y: 9000.0),
            (x: 9500.0, y: 9500.0),
            (x: 9000.0, y: 9500.0),
        ]]),
    );
    store
}

pub fn outputs() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_layer("troncon_hydrographique_cours_d_eau_corr", working_layer());
    store
}
