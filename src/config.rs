//! Command line configuration: package directories plus pipeline
//! parameters, read from `refhydro.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use refhydro_core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "refhydro.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Package holding correction layers and outlet sources
    #[serde(default = "default_inputs")]
    pub inputs: PathBuf,
    /// Package holding the working layer and every produced layer
    #[serde(default = "default_outputs")]
    pub outputs: PathBuf,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_inputs() -> PathBuf {
    PathBuf::from("inputs")
}
fn default_outputs() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: default_inputs(),
            outputs: default_outputs(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or `refhydro.toml` from the working directory when
    /// present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = std::env::current_dir()?.join(CONFIG_FILE);
                if !candidate.is_file() {
                    tracing::debug!("No {CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}
