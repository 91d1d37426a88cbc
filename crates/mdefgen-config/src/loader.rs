//! Configuration loader with multi-source merging

use crate::{MdefgenConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    input_file: Option<PathBuf>,
}

/// Prefix of environment overrides (`MDEFGEN_CONNECTION_STRING`, `MDEFGEN_RUNNER__OUTPUT_DIR`).
const ENV_PREFIX: &str = "MDEFGEN";

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            input_file: None,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Add an explicit input file (TOML, or JSON by `.json` extension).
    ///
    /// It overrides every config file but not the environment.
    pub fn with_input_file(mut self, path: impl AsRef<Path>) -> Self {
        self.input_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<MdefgenConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = MdefgenConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/mdefgen/config.toml)
        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(toml_file(user_config_file));
            }
        }

        // 3. Project config (mdefgen.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(toml_file(project_config_file));
        }

        // 4. Local config (mdefgen.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(toml_file(local_config_file));
        }

        // 5. Explicit input file (must exist)
        if let Some(input) = &self.input_file {
            let format = match input.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("json") => config::FileFormat::Json,
                _ => config::FileFormat::Toml,
            };
            builder = builder.add_source(
                config::File::from(input.as_path())
                    .required(true)
                    .format(format),
            );
        }

        // 6. Environment variables (MDEFGEN_*, `__` between nested keys)
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let mut mdefgen_config: MdefgenConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Resolve relative paths
        mdefgen_config.resolve_paths(&self.project_dir);

        Ok(mdefgen_config)
    }
}

fn toml_file(path: PathBuf) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::from(path)
        .required(false)
        .format(config::FileFormat::Toml)
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RevisionMode, RevisionSelector};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config.source.vcs_command, "p4");
        assert_eq!(config.runner.executable, "Touchstone.exe");
        assert_eq!(config.runner.baseline_suite, "Integration");
        assert_eq!(config.revisions.mode, RevisionMode::LatestVsPrevious);
        assert!(config.suites.is_empty());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
connection_string = "DSN=Salesforce"

[revisions]
mode = "compare-two-revisions"
compare = [12, 9]

[source]
mdef_location = "depot/Salesforce.mdef"

[[suites]]
name = "Integration"
test_sets = [{ name = "SQL_SELECT_ALL", starting_id = 100 }]

[[suites]]
name = "SP"
test_sets = [{ name = "SQL_SP", starting_id = 1 }]
procedures = [{ name = "sp_accounts", args = "10" }]
"#;
        fs::write(project_dir.join("mdefgen.toml"), config_content)
            .expect("Failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.connection_string, "DSN=Salesforce");
        assert_eq!(
            config.revisions.selector().unwrap(),
            RevisionSelector::Explicit { older: 9, newer: 12 }
        );
        assert_eq!(config.suites.len(), 2);
        assert_eq!(config.suites[0].test_sets[0].starting_id, 100);
        assert_eq!(config.suites[1].procedures[0].name, "sp_accounts");
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("mdefgen.toml"),
            r#"
connection_string = "DSN=Project"
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("mdefgen.local.toml"),
            r#"
connection_string = "DSN=Local"
"#,
        )
        .expect("Failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.connection_string, "DSN=Local");
    }

    #[test]
    fn test_json_input_file_overrides_project() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(project_dir.join("mdefgen.toml"), "connection_string = \"DSN=Project\"\n")
            .expect("Failed to write project config");
        let input = project_dir.join("input.json");
        fs::write(
            &input,
            r#"{ "connection_string": "DSN=Input", "synthesis": { "seed": 42 } }"#,
        )
        .expect("Failed to write input file");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .with_input_file(&input)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.connection_string, "DSN=Input");
        assert_eq!(config.synthesis.seed, Some(42));
    }

    #[test]
    fn test_missing_input_file_is_an_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let result = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .with_input_file(temp_dir.path().join("absent.toml"))
            .load();
        assert!(result.is_err());
    }

    // Environment variables are not exercised here: the process environment is
    // shared between tests. In actual usage:
    //
    // MDEFGEN_CONNECTION_STRING="DSN=Other"
    // MDEFGEN_RUNNER__TOOL_DIR=C:\Touchstone
    // MDEFGEN_SYNTHESIS__SEED=7

    #[test]
    fn test_path_resolution() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        // Relative paths should be resolved to absolute
        assert!(config.runner.output_dir.is_absolute());
        assert!(config.source.scratch_dir.is_absolute());
        assert!(config.source.vcs_root.is_absolute());
    }
}
