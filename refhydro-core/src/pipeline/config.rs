use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_BUFFER_DISTANCE, DEFAULT_PRUNE_LENGTH, DEFAULT_PRUNE_MIN_ORDER, DEFAULT_QUANTIZATION,
    DEFAULT_SURFACE_BUFFER, Error, Length,
    algo::{AggregateOptions, PruneRule},
    connectivity::Direction,
};

/// Parameters shared by every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_quantization")]
    pub quantization: f64,
    #[serde(default = "default_buffer_distance")]
    pub buffer_distance: Length,
    #[serde(default = "default_prune_length")]
    pub prune_length: Length,
    #[serde(default = "default_prune_min_order")]
    pub prune_min_order: u32,
    /// Share of an edge's length that must lie inside water surfaces
    #[serde(default = "default_surface_min_percent")]
    pub surface_min_percent: f64,
    /// Buffer around the dissolved water surfaces
    #[serde(default = "default_surface_buffer")]
    pub surface_buffer: Length,
    #[serde(default = "default_crs")]
    pub crs: String,
    #[serde(default)]
    pub trace_direction: Direction,
    /// Remove canals automatically before building the reference network
    #[serde(default)]
    pub auto_canal_removal: bool,
    /// CSV file with a `cleabs` column replacing the canal deletion layer
    #[serde(default)]
    pub canal_id_list: Option<PathBuf>,
    #[serde(default)]
    pub aggregate: AggregateOptions,
    #[serde(default)]
    pub layers: LayerNames,
}

/// Names of every layer read or written by the stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerNames {
    /// Working stream layer, corrected in place
    pub working: String,
    pub corr_connection_and_direction: String,
    pub corr_connection: String,
    pub corr_direction: String,
    pub corr_geometry: String,
    pub corr_canal: String,
    /// Optional second deletion layer for canals and secondary channels
    pub corr_canal_multichannel: Option<String>,
    pub coastline: String,
    pub lakes: String,
    pub borders: String,
    pub lake_lines: String,
    pub outlets: String,
    pub troncon: String,
    pub segment: String,
    pub nodes: String,
    pub ordered: String,
    pub surfaces: String,
    pub width: String,
}

fn default_quantization() -> f64 {
    DEFAULT_QUANTIZATION
}
fn default_buffer_distance() -> Length {
    DEFAULT_BUFFER_DISTANCE
}
fn default_prune_length() -> Length {
    DEFAULT_PRUNE_LENGTH
}
fn default_prune_min_order() -> u32 {
    DEFAULT_PRUNE_MIN_ORDER
}
fn default_surface_min_percent() -> f64 {
    100.0
}
fn default_surface_buffer() -> Length {
    DEFAULT_SURFACE_BUFFER
}
fn default_crs() -> String {
    "EPSG:2154".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quantization: default_quantization(),
            buffer_distance: default_buffer_distance(),
            prune_length: default_prune_length(),
            prune_min_order: default_prune_min_order(),
            surface_min_percent: default_surface_min_percent(),
            surface_buffer: default_surface_buffer(),
            crs: default_crs(),
            trace_direction: Direction::default(),
            auto_canal_removal: false,
            canal_id_list: None,
            aggregate: AggregateOptions::default(),
            layers: LayerNames::default(),
        }
    }
}

impl Default for LayerNames {
    fn default() -> Self {
        Self {
            working: "troncon_hydrographique_cours_d_eau_corr".to_string(),
            corr_connection_and_direction:
                "troncon_hydrographique_corr_connection_and_dir_ecoulement".to_string(),
            corr_connection: "troncon_hydrographique_corr_connection".to_string(),
            corr_direction: "troncon_hydrographique_corr_dir_ecoulement".to_string(),
            corr_geometry: "troncon_hydrographique_corr_geom".to_string(),
            corr_canal: "troncon_hydrographique_corr_suppr_canal".to_string(),
            corr_canal_multichannel: None,
            coastline: "limite_terre_mer".to_string(),
            lakes: "plan_d_eau_selected".to_string(),
            borders: "frontiere".to_string(),
            lake_lines: "plan_d_eau_line".to_string(),
            outlets: "exutoire".to_string(),
            troncon: "reference_hydrographique_troncon".to_string(),
            segment: "reference_hydrographique_segment".to_string(),
            nodes: "reference_hydrographique_noeud".to_string(),
            ordered: "reference_hydrographique_segment_ordre".to_string(),
            surfaces: "surface_hydrographique_naturel_retenue".to_string(),
            width: "reference_hydrographique_5m".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.quantization.is_finite() && self.quantization > 0.0) {
            return Err(Error::Config(format!(
                "quantization must be positive, got {}",
                self.quantization
            )));
        }
        for (name, value) in [
            ("buffer_distance", self.buffer_distance),
            ("prune_length", self.prune_length),
            ("surface_buffer", self.surface_buffer),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.surface_min_percent) {
            return Err(Error::Config(format!(
                "surface_min_percent must be within 0..=100, got {}",
                self.surface_min_percent
            )));
        }
        if self.crs.trim().is_empty() {
            return Err(Error::Config("crs must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn prune_rule(&self) -> PruneRule {
        PruneRule {
            length_threshold: self.prune_length,
            min_order: self.prune_min_order,
        }
    }
}
