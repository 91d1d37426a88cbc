//! `generate` and `results`: the full pipeline.

use anyhow::{Context, Result};
use mdefgen_harness::{
    OutputLayout, PerforceSource, Pipeline, PipelineOutcome, PipelineReport, RunMode,
    TouchstoneRunner,
};

use super::GlobalArgs;
use crate::style::{
    print_header, print_labeled, print_spacer, print_success, print_warn, report_table,
};

pub fn run(args: &GlobalArgs, mode: RunMode) -> Result<()> {
    let config = args.load_config()?;

    let source = PerforceSource::new(&config.source.vcs_command, &config.source.scratch_dir);
    let runner = TouchstoneRunner::new(
        OutputLayout::new(&config.runner.output_dir),
        &config.runner.executable,
    );
    let output_dir = config.runner.output_dir.clone();

    let mut pipeline = Pipeline::new(config, source, runner);
    let outcome = pipeline
        .run(mode)
        .context("Generation pipeline aborted")?;

    match outcome {
        PipelineOutcome::NoDifference => {
            print_warn("The compared metadata versions add no tables; nothing was generated.");
        }
        PipelineOutcome::Completed(report) => {
            print_report(&report);
            print_labeled("Output", &output_dir.display().to_string());
        }
    }
    Ok(())
}

fn print_report(report: &PipelineReport) {
    print_header("New tables");
    for table in &report.new_tables {
        println!("  {table}");
    }
    if !report.new_procedures.is_empty() {
        print_header("New stored procedures");
        for procedure in &report.new_procedures {
            println!("  {procedure}");
        }
    }
    print_spacer();

    println!("{}", report_table(report));

    for run in report.suite_runs.iter().filter(|r| !r.produced_results) {
        print_warn(&format!("Suite {} produced no result sets", run.suite));
    }

    print_labeled("Seed", &report.seed.to_string());
    if report.is_clean() {
        print_success("All test sets written");
    } else {
        let failed = report.failures().count();
        print_warn(&format!("{failed} test sets produced no queries"));
    }
}
