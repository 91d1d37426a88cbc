//! Configuration management for mdefgen
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (MDEFGEN_* prefix, highest precedence)
//! 2. An explicit input file (`--config`, TOML or JSON)
//! 3. mdefgen.local.toml (gitignored, local overrides)
//! 4. mdefgen.toml (git-tracked, project config)
//! 5. ~/.config/mdefgen/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main mdefgen configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MdefgenConfig {
    /// Connection string written into the test environment.
    pub connection_string: String,
    pub revisions: RevisionsConfig,
    pub source: SourceConfig,
    pub runner: RunnerConfig,
    pub synthesis: SynthesisConfig,
    pub suites: Vec<SuiteConfig>,
}

/// How the two metadata versions to compare are chosen.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RevisionMode {
    CompareTwoRevisions,
    #[default]
    LatestVsPrevious,
    ModifiedFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionsConfig {
    pub mode: RevisionMode,
    /// Two revision numbers, in any order.
    pub compare: Vec<u32>,
    /// Local metadata file compared against the head revision.
    pub modified_mdef: Option<PathBuf>,
    /// Treat the whole modified file as new (no previous revision exists).
    pub first_revision: bool,
}

/// Validated revision selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionSelector {
    Explicit { older: u32, newer: u32 },
    LatestVsPrevious,
    ModifiedFile { path: PathBuf, first_revision: bool },
}

impl RevisionsConfig {
    /// Validates the section and returns the selector it describes.
    pub fn selector(&self) -> Result<RevisionSelector, ConfigError> {
        match self.mode {
            RevisionMode::CompareTwoRevisions => {
                let [a, b] = self.compare.as_slice() else {
                    return Err(ConfigError::ValidationError(format!(
                        "revisions.compare needs exactly two revisions, got {}",
                        self.compare.len()
                    )));
                };
                if a == b {
                    return Err(ConfigError::ValidationError(
                        "revisions.compare revisions must be different".to_string(),
                    ));
                }
                if *a == 0 || *b == 0 {
                    return Err(ConfigError::ValidationError(
                        "revision numbers start at 1".to_string(),
                    ));
                }
                Ok(RevisionSelector::Explicit {
                    older: *a.min(b),
                    newer: *a.max(b),
                })
            }
            RevisionMode::LatestVsPrevious => Ok(RevisionSelector::LatestVsPrevious),
            RevisionMode::ModifiedFile => {
                let path = self.modified_mdef.clone().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "revisions.modified_mdef is required in modified-file mode".to_string(),
                    )
                })?;
                if !path.is_file() {
                    return Err(ConfigError::MissingFile {
                        what: "Modified metadata file",
                        path,
                    });
                }
                Ok(RevisionSelector::ModifiedFile {
                    path,
                    first_revision: self.first_revision,
                })
            }
        }
    }

    /// True when starting IDs should all collapse to 1.
    pub fn is_first_revision(&self) -> bool {
        self.mode == RevisionMode::ModifiedFile && self.first_revision
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local root of the version-control workspace.
    pub vcs_root: PathBuf,
    /// Metadata file, relative to `vcs_root`.
    pub mdef_location: Option<PathBuf>,
    pub vcs_command: String,
    /// Where fetched revisions are written.
    pub scratch_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            vcs_root: PathBuf::from("."),
            mdef_location: None,
            vcs_command: "p4".to_string(),
            scratch_dir: PathBuf::from(".ignore"),
        }
    }
}

impl SourceConfig {
    /// Local path of the tracked metadata file.
    pub fn mdef_path(&self) -> Result<PathBuf, ConfigError> {
        let location = self.mdef_location.as_ref().ok_or_else(|| {
            ConfigError::ValidationError("source.mdef_location is not set".to_string())
        })?;
        let relative: PathBuf = location
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        Ok(self.vcs_root.join(relative))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory holding the runner executable and its assets.
    pub tool_dir: Option<PathBuf>,
    pub executable: String,
    /// Files copied from `tool_dir` into the output directory.
    pub assets: Vec<String>,
    pub output_dir: PathBuf,
    /// Suite whose SQL_SELECT_ALL run produces the sampled results.
    pub baseline_suite: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tool_dir: None,
            executable: "Touchstone.exe".to_string(),
            assets: vec![
                "Touchstone.exe".to_string(),
                "sbicudt58_64.dll".to_string(),
                "sbicuuc58d_64.dll".to_string(),
            ],
            output_dir: PathBuf::from("Output"),
            baseline_suite: "Integration".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Fixed seed for reproducible output; drawn at random when absent.
    pub seed: Option<u64>,
}

/// A suite and the test sets generated for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuiteConfig {
    pub name: String,
    #[serde(default)]
    pub test_sets: Vec<TestSetConfig>,
    /// Stored procedure calls for the SQL_SP test set.
    #[serde(default)]
    pub procedures: Vec<ProcedureConfig>,
}

impl SuiteConfig {
    pub fn test_set(&self, name: &str) -> Option<&TestSetConfig> {
        self.test_sets.iter().find(|t| t.name == name)
    }

    pub fn test_set_names(&self) -> Vec<&str> {
        self.test_sets.iter().map(|t| t.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestSetConfig {
    pub name: String,
    #[serde(default = "default_starting_id")]
    pub starting_id: i64,
}

fn default_starting_id() -> i64 {
    1
}

impl TestSetConfig {
    /// First test ID to write. Non-positive IDs, and every ID of a first
    /// revision, become 1.
    pub fn effective_starting_id(&self, first_revision: bool) -> u32 {
        if first_revision || self.starting_id <= 0 {
            return 1;
        }
        u32::try_from(self.starting_id).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcedureConfig {
    pub name: String,
    #[serde(default)]
    pub args: String,
}

impl MdefgenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    pub fn suite(&self, name: &str) -> Option<&SuiteConfig> {
        self.suites.iter().find(|s| s.name == name)
    }

    /// Checks everything a pipeline run depends on.
    pub fn validate(&self) -> Result<RevisionSelector, ConfigError> {
        if self.connection_string.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "connection_string must not be empty".to_string(),
            ));
        }

        let selector = self.revisions.selector()?;
        let needs_vcs = !matches!(
            selector,
            RevisionSelector::ModifiedFile {
                first_revision: true,
                ..
            }
        );
        if needs_vcs {
            self.source.mdef_path()?;
        }

        let baseline = self.suite(&self.runner.baseline_suite).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "baseline suite {} is not configured",
                self.runner.baseline_suite
            ))
        })?;
        if baseline.test_set("SQL_SELECT_ALL").is_none() {
            return Err(ConfigError::ValidationError(format!(
                "baseline suite {} must include SQL_SELECT_ALL",
                baseline.name
            )));
        }

        Ok(selector)
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.source.vcs_root);
        resolve(&mut self.source.scratch_dir);
        resolve(&mut self.runner.output_dir);
        if let Some(tool_dir) = self.runner.tool_dir.as_mut() {
            resolve(tool_dir);
        }
        if let Some(modified) = self.revisions.modified_mdef.as_mut() {
            resolve(modified);
        }
    }
}
