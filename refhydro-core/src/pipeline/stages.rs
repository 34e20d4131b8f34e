use itertools::Itertools;
use log::{debug, info};

use super::{PipelineConfig, StageReport};
use crate::{
    Error, Layer, TopologyWarning,
    algo::{ReachAggregator, StreamOrderCalculator, select_within},
    connectivity::{ConnectivityTracer, OutletSet, fix_network_connectivity, principal_stem},
    correction::{
        CorrectionApplier, CorrectionOp, CorrectionReport, CorrectionSet, canal_deletion_set,
    },
    loading::{LayerStore, SaveMode, read_id_list},
    network::{NetworkGraphBuilder, remove_duplicate_geometries},
};

fn record(report: &mut StageReport, correction: CorrectionReport) {
    report.add("added", correction.added);
    report.add("reversed", correction.reversed);
    report.add("replaced", correction.replaced);
    report.add("removed", correction.removed);
    report.add("duplicates_collapsed", correction.duplicates_collapsed);
    report.add("already_present", correction.already_present.len());
    report.warn(correction.warnings);
}

fn load_outlets(config: &PipelineConfig, outputs: &dyn LayerStore) -> Result<OutletSet, Error> {
    let layer = outputs.load_layer(&config.layers.outlets)?;
    if layer.is_empty() {
        return Err(Error::load(&config.layers.outlets, "outlet layer is empty"));
    }
    Ok(OutletSet::from_layer(&layer, config.buffer_distance))
}

/// Applies the correction layers onto the working layer, in order:
/// connection and direction, connection, direction, geometry, canal
/// removal and, when configured, the second canal removal layer.
pub fn run_corrections(
    config: &PipelineConfig,
    inputs: &dyn LayerStore,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!("Correcting {}", names.working);

    let mut working = outputs.load_layer(&names.working)?;
    let mut report = StageReport::new("correct");
    let applier = CorrectionApplier;

    let steps = [
        (&names.corr_connection_and_direction, CorrectionOp::AddAndReverse),
        (&names.corr_connection, CorrectionOp::AddMissing),
        (&names.corr_direction, CorrectionOp::ReverseDirection),
        (&names.corr_geometry, CorrectionOp::ReplaceGeometry),
    ];
    for (layer, op) in steps {
        let corrections = inputs.load_layer(layer)?;
        record(&mut report, applier.apply(&mut working, &corrections, op)?);
    }

    let canals = match &config.canal_id_list {
        Some(path) => CorrectionSet::from_ids(read_id_list(path)?),
        None => CorrectionSet::from_layer(&inputs.load_layer(&names.corr_canal)?)?,
    };
    record(
        &mut report,
        applier.apply_set(&mut working, &canals, CorrectionOp::Delete)?,
    );

    if let Some(layer) = &names.corr_canal_multichannel {
        let corrections = inputs.load_layer(layer)?;
        record(
            &mut report,
            applier.apply(&mut working, &corrections, CorrectionOp::Delete)?,
        );
    }

    outputs.save_layer(&working, &names.working, SaveMode::Update)?;
    report.add("features", working.len());
    Ok(report)
}

/// Merges coastline, lake shores and borders into the outlet layer
pub fn create_outlets(
    config: &PipelineConfig,
    inputs: &dyn LayerStore,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!(
        "Creating outlets from {}, {} and {}",
        names.coastline, names.lakes, names.borders
    );

    let coast = inputs.load_lines(&names.coastline)?;
    let lakes = inputs.load_polygons(&names.lakes)?;
    let borders = inputs.load_lines(&names.borders)?;

    let mut report = StageReport::new("outlets");
    report.add("coast_lines", coast.len());
    report.add("lakes", lakes.0.len());
    report.add("border_lines", borders.len());

    let outlets = OutletSet::from_sources(coast, &lakes, borders, config.buffer_distance);
    let lake_lines = Layer::from_features(&names.lake_lines, outlets.lake_lines());
    outputs.save_layer(&lake_lines, &names.lake_lines, SaveMode::Update)?;
    outputs.save_layer(
        &outlets.to_layer(&names.outlets),
        &names.outlets,
        SaveMode::Update,
    )?;
    report.add("outlet_lines", outlets.len());
    Ok(report)
}

/// Deletes canal features that are not needed to keep the natural network
/// connected to its outlets
pub fn remove_canals_auto(
    config: &PipelineConfig,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!("Removing canals automatically from {}", names.working);

    let mut working = outputs.load_layer(&names.working)?;
    let outlets = load_outlets(config, outputs)?;
    let (graph, build) = NetworkGraphBuilder::new(config.quantization).build(working.features());
    let deletion = CorrectionSet::from_ids(canal_deletion_set(&graph, &outlets));

    let mut report = StageReport::new("remove canals");
    report.warn(build.warnings);
    record(
        &mut report,
        CorrectionApplier.apply_set(&mut working, &deletion, CorrectionOp::Delete)?,
    );
    outputs.save_layer(&working, &names.working, SaveMode::Update)?;
    report.add("features", working.len());
    Ok(report)
}

/// Builds the connected reference network: duplicate removal, principal
/// stem, selection of the part connected to the outlets, then aggregation
/// into segments
pub fn create_reference(
    config: &PipelineConfig,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!("Creating reference network from {}", names.working);

    let working = outputs.load_layer(&names.working)?;
    let outlets = load_outlets(config, outputs)?;
    let mut report = StageReport::new("reference");
    report.add("features", working.len());

    let (features, duplicates) = remove_duplicate_geometries(working.into_features());
    report.add("duplicates_removed", duplicates);
    if duplicates > 0 {
        report.warn([TopologyWarning::DuplicateGeometries { count: duplicates }]);
    }

    let builder = NetworkGraphBuilder::new(config.quantization);
    let (graph, build) = builder.build(&features);
    report.add("degenerate", build.degenerate.len());
    report.warn(build.warnings);

    let stem = principal_stem(&graph);
    report.add("secondary_channels", graph.edge_count() - stem.len());
    let (graph, _) = builder.build(&graph.features_for(stem));

    let seeds = outlets.seed_nodes(&graph);
    report.add("outlet_nodes", seeds.len());
    let trace = ConnectivityTracer::new(&graph).trace(&seeds, config.trace_direction);
    report.add("disconnected", graph.edge_count() - trace.edges.len());

    let troncon = Layer::from_features(&names.troncon, graph.features_for(trace.edges));
    outputs.save_layer(&troncon, &names.troncon, SaveMode::Update)?;
    report.add("troncon", troncon.len());

    let (graph, _) = builder.build(troncon.features());
    outputs.save_nodes(&graph.node_records(), &names.nodes)?;
    report.add("nodes", graph.node_count());

    let aggregation = ReachAggregator::new(config.aggregate.clone()).aggregate(&graph);
    report.warn(aggregation.warnings.iter().cloned());
    let segments = Layer::from_features(&names.segment, aggregation.into_features());
    outputs.save_layer(&segments, &names.segment, SaveMode::Update)?;
    report.add("segments", segments.len());
    Ok(report)
}

/// Annotates segments with measure and stream orders after pruning small
/// tributaries and aggregating again
pub fn compute_orders(
    config: &PipelineConfig,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!("Computing stream orders on {}", names.segment);

    let segments = outputs.load_layer(&names.segment)?;
    let outlets = load_outlets(config, outputs)?;
    let builder = NetworkGraphBuilder::new(config.quantization);
    let calculator = StreamOrderCalculator::new(config.prune_rule());
    let aggregator = ReachAggregator::new(config.aggregate.clone());
    let mut report = StageReport::new("order");
    report.add("segments", segments.len());

    let (graph, build) = builder.build(segments.features());
    report.warn(build.warnings);
    let orders = calculator.compute(&graph, &outlets.seed_nodes(&graph));
    let (pruned_graph, pruned) = calculator.prune(&graph, &orders);
    report.add("pruned", pruned.len());
    if !pruned.is_empty() {
        debug!("Pruned tributaries: {}", pruned.iter().join(", "));
    }

    let aggregation = aggregator.aggregate(&pruned_graph);
    report.warn(aggregation.warnings.iter().cloned());
    let (graph, _) = builder.build(&aggregation.into_features());
    let orders = calculator.compute(&graph, &outlets.seed_nodes(&graph));
    report.warn(orders.warnings.iter().cloned());

    let ordered = Layer::from_features(&names.ordered, orders.annotate(&graph));
    outputs.save_layer(&ordered, &names.ordered, SaveMode::Update)?;
    report.add("reaches", ordered.len());
    report.add(
        "max_strahler",
        orders.strahler.iter().flatten().max().copied().unwrap_or(0) as usize,
    );
    report.add(
        "unmeasured",
        orders.measure.edges().iter().filter(|m| m.is_none()).count(),
    );
    Ok(report)
}

/// Keeps the segments lying inside water surfaces, reconnects them and
/// aggregates the result
pub fn create_width_network(
    config: &PipelineConfig,
    inputs: &dyn LayerStore,
    outputs: &mut dyn LayerStore,
) -> Result<StageReport, Error> {
    config.validate()?;
    let names = &config.layers;
    info!("Selecting {} inside {}", names.segment, names.surfaces);

    let surfaces = inputs.load_polygons(&names.surfaces)?;
    let segments = outputs.load_layer(&names.segment)?;
    let builder = NetworkGraphBuilder::new(config.quantization);
    let mut report = StageReport::new("width");
    report.add("segments", segments.len());

    let (graph, _) = builder.build(segments.features());
    let inside = select_within(
        &graph,
        &surfaces,
        config.surface_buffer,
        config.surface_min_percent,
    );
    report.add("inside", inside.len());
    let connected = fix_network_connectivity(&graph, &inside);
    report.add("bridging", connected.len() - inside.len());

    let (graph, _) = builder.build(&graph.features_for(connected));
    let aggregation = ReachAggregator::new(config.aggregate.clone()).aggregate(&graph);
    report.warn(aggregation.warnings.iter().cloned());
    let width = Layer::from_features(&names.width, aggregation.into_features());
    outputs.save_layer(&width, &names.width, SaveMode::Update)?;
    report.add("reaches", width.len());
    Ok(report)
}

/// Corrections, outlets, optional automatic canal removal, reference
/// network and stream orders, stopping at the first failure
pub fn run_all(
    config: &PipelineConfig,
    inputs: &dyn LayerStore,
    outputs: &mut dyn LayerStore,
) -> Result<Vec<StageReport>, Error> {
    let mut reports = vec![
        run_corrections(config, inputs, outputs)?,
        create_outlets(config, inputs, outputs)?,
    ];
    if config.auto_canal_removal {
        reports.push(remove_canals_auto(config, outputs)?);
    }
    reports.push(create_reference(config, outputs)?);
    reports.push(compute_orders(config, outputs)?);
    Ok(reports)
}
