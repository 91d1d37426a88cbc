//! Error types for the pipeline and its external collaborators.

use mdefgen_config::ConfigError;
use mdefgen_mdef::MdefError;
use mdefgen_synth::SynthError;
use std::path::PathBuf;
use thiserror::Error;

/// Harness errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A file, directory or revision does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The version-control command failed.
    #[error("{command} failed: {reason}")]
    Vcs { command: String, reason: String },

    /// The suite runner could not be started or produced no results.
    #[error("Suite {suite} failed: {reason}")]
    RunnerFailed { suite: String, reason: String },

    /// A runner asset is missing from the tool directory.
    #[error("Runner asset {asset} missing from {}", dir.display())]
    MissingAsset { asset: String, dir: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mdef(#[from] MdefError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
