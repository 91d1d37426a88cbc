//! CLI command implementations.

pub mod config;
pub mod diff;
pub mod generate;
pub mod samples;
pub mod version;

use anyhow::{Context, Result};
use mdefgen_config::{ConfigLoader, MdefgenConfig};
use std::path::PathBuf;

/// Flags shared by every subcommand.
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub project: PathBuf,
    pub seed: Option<u64>,
}

impl GlobalArgs {
    /// Loads the layered configuration and applies command-line overrides.
    pub fn load_config(&self) -> Result<MdefgenConfig> {
        let mut loader = ConfigLoader::new().with_project_dir(&self.project);
        if let Some(input) = &self.config {
            loader = loader.with_input_file(input);
        }
        let mut config = loader.load().context("Failed to load configuration")?;
        if let Some(seed) = self.seed {
            config.synthesis.seed = Some(seed);
        }
        Ok(config)
    }
}
