//! On-disk layout of the runner's output directory.
//!
//! ```text
//! Output/
//!   Touchstone.exe, *.dll      copied from the tool directory
//!   Envs/TestEnv.xml
//!   <Suite>/TestSuite.xml
//!   <Suite>/TestSets/<TestSet>.xml
//!   <Suite>/ResultSets/SQL_SELECT_ALL-SQL_QUERY-<id>.xml
//! ```

use crate::{HarnessError, Result};
use mdefgen_synth::document::{DOCUMENT_EXTENSION, TEST_ENV_FILE, TEST_SUITE_FILE};
use mdefgen_synth::{TestCategory, TestSetDocument, test_env_xml, test_suite_xml};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENVS_DIR: &str = "Envs";
pub const TEST_SETS_DIR: &str = "TestSets";
pub const RESULT_SETS_DIR: &str = "ResultSets";

/// Paths inside the output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn envs_dir(&self) -> PathBuf {
        self.root.join(ENVS_DIR)
    }

    pub fn test_env_file(&self) -> PathBuf {
        self.envs_dir().join(TEST_ENV_FILE)
    }

    pub fn suite_dir(&self, suite: &str) -> PathBuf {
        self.root.join(suite)
    }

    pub fn test_suite_file(&self, suite: &str) -> PathBuf {
        self.suite_dir(suite).join(TEST_SUITE_FILE)
    }

    pub fn test_sets_dir(&self, suite: &str) -> PathBuf {
        self.suite_dir(suite).join(TEST_SETS_DIR)
    }

    pub fn result_sets_dir(&self, suite: &str) -> PathBuf {
        self.suite_dir(suite).join(RESULT_SETS_DIR)
    }

    /// Result file of one baseline `SELECT *` query.
    pub fn baseline_result_file(&self, suite: &str, id: u32) -> PathBuf {
        self.result_sets_dir(suite).join(format!(
            "{}-SQL_QUERY-{id}.{DOCUMENT_EXTENSION}",
            TestCategory::SelectAll.test_set_name()
        ))
    }

    /// Creates the output directory and copies any missing runner assets.
    pub fn prepare_output(&self, tool_dir: Option<&Path>, assets: &[String]) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let missing: Vec<&String> = assets
            .iter()
            .filter(|asset| !self.root.join(asset.as_str()).is_file())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let tool_dir = tool_dir.ok_or_else(|| {
            HarnessError::NotFound(format!(
                "runner.tool_dir is not set and {} runner assets are missing",
                missing.len()
            ))
        })?;
        if !tool_dir.is_dir() {
            return Err(HarnessError::NotFound(tool_dir.display().to_string()));
        }

        for asset in missing {
            let source = tool_dir.join(asset.as_str());
            if !source.is_file() {
                return Err(HarnessError::MissingAsset {
                    asset: asset.clone(),
                    dir: tool_dir.to_path_buf(),
                });
            }
            fs::copy(&source, self.root.join(asset.as_str()))?;
            debug!(asset = %asset, "copied runner asset");
        }
        info!(output = %self.root.display(), "prepared output directory");
        Ok(())
    }

    /// Recreates `Envs/` and writes the test environment.
    pub fn write_test_env(&self, connection_string: &str) -> Result<PathBuf> {
        recreate_dir(&self.envs_dir())?;
        let path = self.test_env_file();
        fs::write(&path, test_env_xml(connection_string))?;
        Ok(path)
    }

    /// Recreates a suite directory with empty `TestSets/` and `ResultSets/`,
    /// then writes its `TestSuite.xml`.
    pub fn reset_suite<S: AsRef<str>>(&self, suite: &str, test_sets: &[S]) -> Result<()> {
        recreate_dir(&self.suite_dir(suite))?;
        fs::create_dir(self.test_sets_dir(suite))?;
        fs::create_dir(self.result_sets_dir(suite))?;
        fs::write(self.test_suite_file(suite), test_suite_xml(suite, test_sets))?;
        debug!(suite, "reset suite directory");
        Ok(())
    }

    pub fn write_test_set(&self, suite: &str, document: &TestSetDocument) -> Result<PathBuf> {
        let dir = self.test_sets_dir(suite);
        if !dir.is_dir() {
            return Err(HarnessError::NotFound(dir.display().to_string()));
        }
        Ok(document.write(&dir)?)
    }

    /// True when the suite's `ResultSets/` holds at least one entry.
    pub fn has_results(&self, suite: &str) -> Result<bool> {
        let dir = self.result_sets_dir(suite);
        if !dir.is_dir() {
            return Ok(false);
        }
        Ok(fs::read_dir(dir)?.next().is_some())
    }
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.test_env_file(), PathBuf::from("/out/Envs/TestEnv.xml"));
        assert_eq!(layout.test_suite_file("SQL"), PathBuf::from("/out/SQL/TestSuite.xml"));
        assert_eq!(
            layout.baseline_result_file("Integration", 7),
            PathBuf::from("/out/Integration/ResultSets/SQL_SELECT_ALL-SQL_QUERY-7.xml")
        );
    }

    #[test]
    fn test_prepare_output_copies_missing_assets() {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("tools");
        fs::create_dir(&tools).unwrap();
        fs::write(tools.join("Runner.exe"), "bin").unwrap();
        fs::write(tools.join("lib.dll"), "dll").unwrap();

        let layout = OutputLayout::new(temp.path().join("Output"));
        let assets = vec!["Runner.exe".to_string(), "lib.dll".to_string()];
        layout.prepare_output(Some(&tools), &assets).unwrap();

        assert_eq!(fs::read_to_string(layout.root().join("lib.dll")).unwrap(), "dll");

        // Already present: no tool directory needed.
        layout.prepare_output(None, &assets).unwrap();
    }

    #[test]
    fn test_prepare_output_reports_missing_asset() {
        let temp = TempDir::new().unwrap();
        let tools = temp.path().join("tools");
        fs::create_dir(&tools).unwrap();

        let layout = OutputLayout::new(temp.path().join("Output"));
        let result = layout.prepare_output(Some(&tools), &["Runner.exe".to_string()]);
        assert!(matches!(result, Err(HarnessError::MissingAsset { ref asset, .. }) if asset == "Runner.exe"));

        let result = layout.prepare_output(None, &["Runner.exe".to_string()]);
        assert!(matches!(result, Err(HarnessError::NotFound(_))));
    }

    #[test]
    fn test_reset_suite_clears_previous_run() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path());

        layout.reset_suite("SQL", &["SQL_LIKE"]).unwrap();
        fs::write(layout.result_sets_dir("SQL").join("old.xml"), "").unwrap();
        assert!(layout.has_results("SQL").unwrap());

        layout.reset_suite("SQL", &["SQL_LIKE"]).unwrap();
        assert!(!layout.has_results("SQL").unwrap());
        assert!(layout.test_sets_dir("SQL").is_dir());
        assert!(
            fs::read_to_string(layout.test_suite_file("SQL"))
                .unwrap()
                .contains("SetFile=\"SQL/TestSets/SQL_LIKE.xml\"")
        );
    }

    #[test]
    fn test_write_test_env_and_set() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp.path());

        let env = layout.write_test_env("DSN=x").unwrap();
        assert!(fs::read_to_string(env).unwrap().contains("DSN=x"));

        let doc = TestSetDocument::new("SQL_LIKE", 1, vec!["SELECT 1".into()]);
        assert!(matches!(layout.write_test_set("SQL", &doc), Err(HarnessError::NotFound(_))));

        layout.reset_suite("SQL", &["SQL_LIKE"]).unwrap();
        let path = layout.write_test_set("SQL", &doc).unwrap();
        assert_eq!(path, layout.test_sets_dir("SQL").join("SQL_LIKE.xml"));
    }
}
