//! Fetching metadata files at a given revision.

use crate::{HarnessError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Source of versioned metadata files.
pub trait RevisionSource {
    /// Materializes `path` at `revision` (head when `None`) as a local file
    /// and returns its location.
    fn fetch(&self, path: &Path, revision: Option<u32>) -> Result<PathBuf>;

    /// Returns the head revision number of `path`.
    fn latest_revision(&self, path: &Path) -> Result<u32>;
}

impl<T: RevisionSource + ?Sized> RevisionSource for &T {
    fn fetch(&self, path: &Path, revision: Option<u32>) -> Result<PathBuf> {
        (**self).fetch(path, revision)
    }

    fn latest_revision(&self, path: &Path) -> Result<u32> {
        (**self).latest_revision(path)
    }
}

/// Perforce command-line client.
///
/// Revisions are written to `<scratch_dir>/<stem>_<rev><ext>`, or
/// `<stem>_Head<ext>` for the head revision.
#[derive(Debug, Clone)]
pub struct PerforceSource {
    command: String,
    scratch_dir: PathBuf,
}

impl PerforceSource {
    pub fn new(command: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!(command = %self.command, ?args, "running version control command");
        let output = Command::new(&self.command)
            .args(args)
            .output()
            .map_err(|e| HarnessError::Vcs {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(HarnessError::Vcs {
                command: format!("{} {}", self.command, args.join(" ")),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(HarnessError::NotFound(path.display().to_string()))
    }
}

/// Local file name of `path` at `revision`.
pub fn revision_file_name(path: &Path, revision: Option<u32>) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let suffix = revision.map_or_else(|| "Head".to_string(), |r| r.to_string());
    match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    }
}

/// Extracts the revision number from `p4 files` output such as
/// `//depot/Source.mdef#12 - edit change 345 (text)`.
pub fn parse_head_revision(output: &str, file_name: &str) -> Option<u32> {
    let record = output.lines().next()?.split(" - ").next()?;
    let marker = format!("{file_name}#");
    let start = record.rfind(&marker)? + marker.len();
    record[start..].trim().parse().ok()
}

impl RevisionSource for PerforceSource {
    fn fetch(&self, path: &Path, revision: Option<u32>) -> Result<PathBuf> {
        ensure_exists(path)?;
        fs::create_dir_all(&self.scratch_dir)?;

        let target = self.scratch_dir.join(revision_file_name(path, revision));
        let file_arg = match revision {
            Some(r) => format!("{}#{r}", path.display()),
            None => path.display().to_string(),
        };
        let target_arg = target.display().to_string();
        self.run(&["print", "-o", &target_arg, &file_arg])?;

        if !target.is_file() {
            return Err(HarnessError::NotFound(file_arg));
        }
        info!(file = %target.display(), ?revision, "fetched metadata revision");
        Ok(target)
    }

    fn latest_revision(&self, path: &Path) -> Result<u32> {
        ensure_exists(path)?;
        let file_arg = path.display().to_string();
        let output = self.run(&["files", &file_arg])?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        parse_head_revision(&output, &file_name).ok_or_else(|| HarnessError::Vcs {
            command: format!("{} files", self.command),
            reason: format!("no revision for {file_name} in {:?}", output.trim()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("//depot/Source.mdef#12 - edit change 345 (text)", Some(12))]
    #[test_case("//depot/Source.mdef#1 - add change 1 (text)\n", Some(1))]
    #[test_case("//depot/Other.mdef#3 - edit", None)]
    #[test_case("", None)]
    fn test_parse_head_revision(output: &str, expected: Option<u32>) {
        assert_eq!(parse_head_revision(output, "Source.mdef"), expected);
    }

    #[test]
    fn test_revision_file_name() {
        let path = Path::new("/p4/depot/Source.mdef");
        assert_eq!(revision_file_name(path, Some(7)), "Source_7.mdef");
        assert_eq!(revision_file_name(path, None), "Source_Head.mdef");
        assert_eq!(revision_file_name(Path::new("NoExt"), Some(2)), "NoExt_2");
    }

    #[test]
    fn test_fetch_missing_path() {
        let temp = tempfile::tempdir().unwrap();
        let source = PerforceSource::new("p4", temp.path());
        assert!(matches!(
            source.fetch(&temp.path().join("absent.mdef"), Some(1)),
            Err(HarnessError::NotFound(_))
        ));
        assert!(matches!(
            source.latest_revision(&temp.path().join("absent.mdef")),
            Err(HarnessError::NotFound(_))
        ));
    }

    #[test]
    fn test_unlaunchable_command() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("Source.mdef");
        fs::write(&file, "{}").unwrap();

        let source = PerforceSource::new("mdefgen-no-such-vcs-binary", temp.path().join("scratch"));
        assert!(matches!(source.fetch(&file, Some(1)), Err(HarnessError::Vcs { .. })));
    }
}
