//! Running test suites through the external runner.

use crate::layout::OutputLayout;
use crate::{HarnessError, Result};
use mdefgen_synth::document::TEST_SUITE_FILE;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Executes a suite (optionally a single test set) and reports whether its
/// result directory ended up with entries.
pub trait SuiteRunner {
    fn run(&self, suite: &str, test_set: Option<&str>) -> Result<bool>;
}

impl<T: SuiteRunner + ?Sized> SuiteRunner for &T {
    fn run(&self, suite: &str, test_set: Option<&str>) -> Result<bool> {
        (**self).run(suite, test_set)
    }
}

/// Runs the Touchstone executable from inside the output directory.
#[derive(Debug, Clone)]
pub struct TouchstoneRunner {
    layout: OutputLayout,
    executable: String,
}

impl TouchstoneRunner {
    pub fn new(layout: OutputLayout, executable: impl Into<String>) -> Self {
        Self {
            layout,
            executable: executable.into(),
        }
    }

    /// Arguments for one invocation, relative to the output directory.
    pub fn arguments(suite: &str, test_set: Option<&str>) -> Vec<String> {
        let env_file = Path::new(crate::layout::ENVS_DIR).join(mdefgen_synth::document::TEST_ENV_FILE);
        let suite_file = Path::new(suite).join(TEST_SUITE_FILE);
        let mut args = vec![
            "-te".to_string(),
            env_file.display().to_string(),
            "-ts".to_string(),
            suite_file.display().to_string(),
            "-o".to_string(),
            suite.to_string(),
        ];
        if let Some(set) = test_set.filter(|s| !s.is_empty()) {
            args.push("-rts".to_string());
            args.push(set.to_string());
        }
        args
    }
}

impl SuiteRunner for TouchstoneRunner {
    fn run(&self, suite: &str, test_set: Option<&str>) -> Result<bool> {
        let executable = self.layout.root().join(&self.executable);
        if !executable.is_file() {
            return Err(HarnessError::NotFound(executable.display().to_string()));
        }

        info!(suite, test_set, "running suite");
        let status = Command::new(&executable)
            .args(Self::arguments(suite, test_set))
            .current_dir(self.layout.root())
            .status()
            .map_err(|e| HarnessError::RunnerFailed {
                suite: suite.to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            // The runner reports failing tests through its exit code; results
            // may still have been written.
            warn!(suite, %status, "runner exited unsuccessfully");
        }

        self.layout.has_results(suite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let args = TouchstoneRunner::arguments("Integration", Some("SQL_SELECT_ALL"));
        let expected_env = Path::new("Envs").join("TestEnv.xml").display().to_string();
        let expected_suite = Path::new("Integration").join("TestSuite.xml").display().to_string();
        assert_eq!(
            args,
            [
                "-te",
                expected_env.as_str(),
                "-ts",
                expected_suite.as_str(),
                "-o",
                "Integration",
                "-rts",
                "SQL_SELECT_ALL"
            ]
        );
        assert_eq!(TouchstoneRunner::arguments("SQL", None).len(), 6);
        assert_eq!(TouchstoneRunner::arguments("SQL", Some("")).len(), 6);
    }

    #[test]
    fn test_missing_executable() {
        let temp = tempfile::tempdir().unwrap();
        let runner = TouchstoneRunner::new(OutputLayout::new(temp.path()), "Touchstone.exe");
        assert!(matches!(runner.run("SQL", None), Err(HarnessError::NotFound(_))));
    }
}
