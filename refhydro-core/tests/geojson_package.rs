mod common;

use std::fs;

use refhydro_core::{
    Layer,
    loading::{GeoJsonStore, LayerStore, SaveMode, read_id_list},
    pipeline::{PipelineConfig, create_outlets, create_reference, run_corrections},
};

fn copy_layers(from: &impl LayerStore, to: &mut GeoJsonStore, names: &[&str]) {
    for name in names {
        let layer = from.load_layer(name).expect("fixture layer");
        to.save_layer(&layer, name, SaveMode::Create)
            .expect("fixture saved");
    }
}

#[test]
fn stages_run_over_geojson_packages() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = PipelineConfig::default();
    let names = &config.layers;

    let fixtures = common::inputs();
    let mut inputs = GeoJsonStore::new(dir.path().join("inputs")).with_crs(&config.crs);
    copy_layers(
        &fixtures,
        &mut inputs,
        &[
            names.corr_connection_and_direction.as_str(),
            names.corr_connection.as_str(),
            names.corr_direction.as_str(),
            names.corr_geometry.as_str(),
            names.corr_canal.as_str(),
        ],
    );
    let mut outputs = GeoJsonStore::new(dir.path().join("outputs")).with_crs(&config.crs);
    outputs
        .save_layer(&common::working_layer(), &names.working, SaveMode::Update)
        .expect("working layer");

    let report = run_corrections(&config, &inputs, &mut outputs).expect("corrections");
    assert_eq!(report.count("features"), Some(5));

    // Outlet sources: the lake package has no polygons on disk, so only
    // the coast is used here
    copy_layers(&fixtures, &mut inputs, &[names.coastline.as_str(), names.borders.as_str()]);
    fs::write(
        inputs.layer_path(&names.lakes),
        r#"{"type":"FeatureCollection","features":[]}"#,
    )
    .expect("lakes");
    let outlets = create_outlets(&config, &inputs, &mut outputs).expect("outlets");
    assert_eq!(outlets.count("outlet_lines"), Some(1));

    let reference = create_reference(&config, &mut outputs).expect("reference");
    assert_eq!(reference.count("segments"), Some(3));
    assert!(outputs.layer_path(&names.nodes).is_file());

    let text = fs::read_to_string(outputs.layer_path(&names.segment)).expect("segment file");
    assert!(text.contains("EPSG:2154"));
    let segments = outputs.load_layer(&names.segment).expect("segments");
    assert!(segments.contains_id("b"));
}

#[test]
fn identifier_list_drives_deletion() {
    let dir = tempfile::tempdir().expect("temp dir");
    let list = dir.path().join("canals.csv");
    fs::write(&list, "cleabs,comment\ncanal,artificial\n t ,\n").expect("list");
    let ids = read_id_list(&list).expect("ids");
    assert_eq!(ids, vec!["canal".to_string(), "t".to_string()]);

    let config = PipelineConfig {
        canal_id_list: Some(list),
        ..PipelineConfig::default()
    };
    let mut outputs = common::outputs();
    let report = run_corrections(&config, &common::inputs(), &mut outputs).expect("corrections");
    assert_eq!(report.count("removed"), Some(2));
    let working: Layer = outputs
        .load_layer(&config.layers.working)
        .expect("working");
    assert!(!working.contains_id("t"));
}
