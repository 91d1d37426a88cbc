//! Configuration management commands.

use anyhow::Result;
use mdefgen_config::{MdefgenConfig, Paths, RevisionSelector};

use super::GlobalArgs;
use crate::style::{
    print_error, print_header, print_labeled, print_spacer, print_success, print_warn,
};

/// Show the merged configuration.
pub fn show(args: &GlobalArgs, format: &str) -> Result<()> {
    let config = args.load_config()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => println!("{}", toml::to_string_pretty(&config)?),
        _ => print_text(&config),
    }
    Ok(())
}

fn print_text(config: &MdefgenConfig) {
    let optional = |value: Option<&std::path::Path>| {
        value.map_or_else(|| "None".to_string(), |p| p.display().to_string())
    };

    print_header("Revisions");
    print_labeled("Mode", &format!("{:?}", config.revisions.mode));
    print_labeled("Compare", &format!("{:?}", config.revisions.compare));
    print_labeled("Modified file", &optional(config.revisions.modified_mdef.as_deref()));
    print_labeled("First revision", &config.revisions.first_revision.to_string());
    print_spacer();

    print_header("Source");
    print_labeled("VCS root", &config.source.vcs_root.display().to_string());
    print_labeled("Metadata", &optional(config.source.mdef_location.as_deref()));
    print_labeled("VCS command", &config.source.vcs_command);
    print_spacer();

    print_header("Runner");
    print_labeled("Tool directory", &optional(config.runner.tool_dir.as_deref()));
    print_labeled("Executable", &config.runner.executable);
    print_labeled("Output", &config.runner.output_dir.display().to_string());
    print_labeled("Baseline suite", &config.runner.baseline_suite);
    print_spacer();

    print_header("Synthesis");
    print_labeled(
        "Seed",
        &config
            .synthesis
            .seed
            .map_or_else(|| "random".to_string(), |s| s.to_string()),
    );
    print_spacer();

    print_header("Suites");
    for suite in &config.suites {
        print_labeled(&suite.name, &suite.test_set_names().join(", "));
    }
}

/// Validate the merged configuration.
pub fn validate(args: &GlobalArgs) -> Result<()> {
    if args.config.is_none() && !Paths::is_initialized(&args.project) {
        print_warn(&format!(
            "No {} found; validating defaults and MDEFGEN_* variables only",
            Paths::project_config_file(&args.project).display()
        ));
    }
    let config = args.load_config()?;

    match config.validate() {
        Ok(selector) => {
            let described = match selector {
                RevisionSelector::Explicit { older, newer } => {
                    format!("revision {newer} against revision {older}")
                }
                RevisionSelector::LatestVsPrevious => "head against the previous revision".to_string(),
                RevisionSelector::ModifiedFile {
                    path,
                    first_revision: true,
                } => format!("all of {}", path.display()),
                RevisionSelector::ModifiedFile { path, .. } => {
                    format!("{} against the head revision", path.display())
                }
            };
            print_success(&format!("Configuration is valid: compares {described}"));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Configuration validation failed: {e}"));
            Err(e.into())
        }
    }
}
