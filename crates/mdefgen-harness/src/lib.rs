//! # mdefgen pipeline harness
//!
//! Connects the generator to the outside world:
//!
//! - **[`RevisionSource`]**: fetches metadata files at a revision
//!   ([`PerforceSource`] shells out to `p4`)
//! - **[`SuiteRunner`]**: executes a test suite and reports whether it left
//!   result sets behind ([`TouchstoneRunner`])
//! - **[`OutputLayout`]**: the runner's output directory tree
//! - **[`Pipeline`]**: the staged run from schema diff to written test sets
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mdefgen_config::MdefgenConfig;
//! use mdefgen_harness::{OutputLayout, PerforceSource, Pipeline, RunMode, TouchstoneRunner};
//!
//! let config = MdefgenConfig::load()?;
//! let source = PerforceSource::new(&config.source.vcs_command, &config.source.scratch_dir);
//! let runner = TouchstoneRunner::new(
//!     OutputLayout::new(&config.runner.output_dir),
//!     &config.runner.executable,
//! );
//!
//! let mut pipeline = Pipeline::new(config, source, runner);
//! let outcome = pipeline.run(RunMode::Generate)?;
//! println!("{outcome:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod layout;
pub mod pipeline;
pub mod revision;
pub mod runner;

pub use error::{HarnessError, Result};
pub use layout::OutputLayout;
pub use pipeline::{
    CategoryOutcome, CategoryReport, Pipeline, PipelineOutcome, PipelineReport, PipelineState,
    RunMode, SuiteRun, compute_diff, extract_baseline_samples,
};
pub use revision::{PerforceSource, RevisionSource};
pub use runner::{SuiteRunner, TouchstoneRunner};
