//! mdefgen command line.
//!
//! Generates ODBC conformance test sets for the tables a metadata revision
//! adds over another.
//!
//! # Quick Start
//!
//! ```bash
//! # Write every configured test set for the latest metadata change
//! mdefgen generate
//!
//! # Same, then run every suite once to produce result sets
//! mdefgen results --seed 42
//!
//! # Inspect what a local metadata change adds
//! mdefgen diff Source_new.mdef Source_old.mdef
//! ```

mod commands;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::GlobalArgs;
use mdefgen_harness::RunMode;
use std::path::PathBuf;

/// mdefgen - metadata-driven SQL test generation.
#[derive(Parser)]
#[command(name = "mdefgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Explicit configuration file (TOML, or JSON by extension).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Project directory holding mdefgen.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Synthesis seed; overrides `synthesis.seed`.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Write every configured test set for the new tables.
    Generate,

    /// Write every test set, then run every suite once.
    Results,

    /// Show the tables and procedures one metadata file adds over another.
    Diff {
        /// Newer metadata file.
        newer: PathBuf,

        /// Older metadata file.
        older: PathBuf,

        /// Output format (text, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Re-extract the sample map from an existing baseline run.
    Samples {
        /// Metadata file the baseline run was generated from.
        newer: PathBuf,

        /// Previous metadata file; without it every table is sampled.
        older: Option<PathBuf>,

        /// Output format (text, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the merged configuration.
    Show {
        /// Output format (text, json, toml).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate the merged configuration.
    Validate,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    let args = GlobalArgs {
        config: cli.config,
        project: cli.project,
        seed: cli.seed,
    };

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Generate => commands::generate::run(&args, RunMode::Generate),
        Commands::Results => commands::generate::run(&args, RunMode::Results),
        Commands::Diff {
            newer,
            older,
            format,
        } => commands::diff::run(&newer, &older, &format),
        Commands::Samples {
            newer,
            older,
            format,
        } => commands::samples::run(&args, &newer, older.as_deref(), &format),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { format } => commands::config::show(&args, &format),
            ConfigCommands::Validate => commands::config::validate(&args),
        },
    }
}
