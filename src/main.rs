//! refhydro: builds a hydrographic reference network from a topographic
//! stream layer.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use refhydro_core::connectivity::Direction;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "refhydro")]
#[command(about = "Hydrographic reference network builder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    overrides: Overrides,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options layered over the configuration file
#[derive(Args)]
struct Overrides {
    /// Configuration file (defaults to ./refhydro.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Package holding correction layers and outlet sources
    #[arg(long, global = true)]
    inputs: Option<PathBuf>,

    /// Package holding the working layer and produced layers
    #[arg(long, global = true)]
    outputs: Option<PathBuf>,

    /// Outlet buffer distance, in map units
    #[arg(long, global = true)]
    buffer_distance: Option<f64>,

    /// Node snapping resolution, in map units
    #[arg(long, global = true)]
    quantization: Option<f64>,

    /// Connectivity trace direction from the outlets
    #[arg(long, global = true, value_enum)]
    direction: Option<TraceDirection>,
}

impl Overrides {
    fn load(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(inputs) = &self.inputs {
            config.inputs = inputs.clone();
        }
        if let Some(outputs) = &self.outputs {
            config.outputs = outputs.clone();
        }
        let pipeline = &mut config.pipeline;
        if let Some(buffer) = self.buffer_distance {
            pipeline.buffer_distance = buffer;
        }
        if let Some(quantization) = self.quantization {
            pipeline.quantization = quantization;
        }
        if let Some(direction) = self.direction {
            pipeline.trace_direction = direction.into();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with the default parameters
    Init {
        #[arg(default_value = config::CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Apply correction layers to the working layer
    Correct {
        /// CSV file with a `cleabs` column used for canal deletion
        #[arg(long)]
        canal_list: Option<PathBuf>,
    },

    /// Build the outlet layer from coastline, lakes and borders
    Outlets,

    /// Delete canals not needed to reach an outlet
    RemoveCanals,

    /// Build the connected reference network and its segments
    Reference,

    /// Compute measure, Strahler and Hack orders
    Order {
        /// Length under which first-order tributaries are pruned
        #[arg(long)]
        prune_length: Option<f64>,
        /// Minimum order of the receiving channel for pruning
        #[arg(long)]
        prune_min_order: Option<u32>,
    },

    /// Select segments inside water surfaces
    Width {
        /// Share of length that must lie inside surfaces, in percent
        #[arg(long)]
        min_percent: Option<f64>,
    },

    /// Run corrections, outlets, reference and orders in sequence
    Run {
        /// Remove canals automatically before building the reference
        #[arg(long)]
        auto_canals: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum TraceDirection {
    Upstream,
    Downstream,
    Both,
}

impl From<TraceDirection> for Direction {
    fn from(direction: TraceDirection) -> Self {
        match direction {
            TraceDirection::Upstream => Direction::Upstream,
            TraceDirection::Downstream => Direction::Downstream,
            TraceDirection::Both => Direction::Both,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path, force } => commands::init(&path, force),
        Commands::Correct { canal_list } => {
            let mut config = cli.overrides.load()?;
            if canal_list.is_some() {
                config.pipeline.canal_id_list = canal_list;
            }
            commands::correct(&config)
        }
        Commands::Outlets => commands::outlets(&cli.overrides.load()?),
        Commands::RemoveCanals => commands::remove_canals(&cli.overrides.load()?),
        Commands::Reference => commands::reference(&cli.overrides.load()?),
        Commands::Order {
            prune_length,
            prune_min_order,
        } => {
            let mut config = cli.overrides.load()?;
            if let Some(length) = prune_length {
                config.pipeline.prune_length = length;
            }
            if let Some(order) = prune_min_order {
                config.pipeline.prune_min_order = order;
            }
            commands::order(&config)
        }
        Commands::Width { min_percent } => {
            let mut config = cli.overrides.load()?;
            if let Some(percent) = min_percent {
                config.pipeline.surface_min_percent = percent;
            }
            commands::width(&config)
        }
        Commands::Run { auto_canals } => {
            let mut config = cli.overrides.load()?;
            config.pipeline.auto_canal_removal |= auto_canals;
            commands::run(&config)
        }
    }
}
