//! One function per subcommand. Each opens the configured packages, runs
//! its stage inside a span and prints the stage report.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use refhydro_core::loading::GeoJsonStore;
use refhydro_core::pipeline::{self, StageReport};
use tracing::{info, info_span, warn};

use crate::config::Config;

struct Stores {
    inputs: GeoJsonStore,
    outputs: GeoJsonStore,
}

impl Stores {
    fn open(config: &Config) -> Result<Self> {
        if !config.inputs.is_dir() {
            bail!("Input package not found: {}", config.inputs.display());
        }
        std::fs::create_dir_all(&config.outputs).with_context(|| {
            format!(
                "Failed to create output package: {}",
                config.outputs.display()
            )
        })?;
        let crs = &config.pipeline.crs;
        Ok(Self {
            inputs: GeoJsonStore::new(&config.inputs).with_crs(crs),
            outputs: GeoJsonStore::new(&config.outputs).with_crs(crs),
        })
    }
}

fn print_report(report: &StageReport) {
    for warning in &report.warnings {
        warn!(stage = %report.stage, "{warning}");
    }
    print!("{report}");
}

fn run_stage<F>(config: &Config, name: &str, stage: F) -> Result<()>
where
    F: FnOnce(&Config, &mut Stores) -> Result<StageReport, refhydro_core::Error>,
{
    let mut stores = Stores::open(config)?;
    let _span = info_span!("stage", name).entered();
    let started = Instant::now();
    let report = stage(config, &mut stores).with_context(|| format!("Stage '{name}' failed"))?;
    info!("Finished in {:.2?}", started.elapsed());
    print_report(&report);
    Ok(())
}

pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    Config::default().save(path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn correct(config: &Config) -> Result<()> {
    run_stage(config, "correct", |config, stores| {
        pipeline::run_corrections(&config.pipeline, &stores.inputs, &mut stores.outputs)
    })
}

pub fn outlets(config: &Config) -> Result<()> {
    run_stage(config, "outlets", |config, stores| {
        pipeline::create_outlets(&config.pipeline, &stores.inputs, &mut stores.outputs)
    })
}

pub fn remove_canals(config: &Config) -> Result<()> {
    run_stage(config, "remove canals", |config, stores| {
        pipeline::remove_canals_auto(&config.pipeline, &mut stores.outputs)
    })
}

pub fn reference(config: &Config) -> Result<()> {
    run_stage(config, "reference", |config, stores| {
        pipeline::create_reference(&config.pipeline, &mut stores.outputs)
    })
}

pub fn order(config: &Config) -> Result<()> {
    run_stage(config, "order", |config, stores| {
        pipeline::compute_orders(&config.pipeline, &mut stores.outputs)
    })
}

pub fn width(config: &Config) -> Result<()> {
    run_stage(config, "width", |config, stores| {
        pipeline::create_width_network(&config.pipeline, &stores.inputs, &mut stores.outputs)
    })
}

pub fn run(config: &Config) -> Result<()> {
    let mut stores = Stores::open(config)?;
    let _span = info_span!("run").entered();
    let started = Instant::now();
    let reports = pipeline::run_all(&config.pipeline, &stores.inputs, &mut stores.outputs)
        .context("Pipeline failed")?;
    info!(stages = reports.len(), "Finished in {:.2?}", started.elapsed());
    for report in &reports {
        print_report(report);
    }
    Ok(())
}
