//! `samples`: re-extract the sample map of an existing baseline run.

use anyhow::{Context, Result, bail};
use mdefgen_harness::{OutputLayout, extract_baseline_samples};
use mdefgen_mdef::{Schema, SchemaDiff};
use mdefgen_synth::TestCategory;
use std::path::Path;

use super::GlobalArgs;
use crate::style::{print_header, sample_table};

pub fn run(args: &GlobalArgs, newer: &Path, older: Option<&Path>, format: &str) -> Result<()> {
    let config = args.load_config()?;

    let newer_schema = Schema::load(newer)
        .with_context(|| format!("Failed to load {}", newer.display()))?;
    let diff = match older {
        Some(older) => {
            let older_schema = Schema::load(older)
                .with_context(|| format!("Failed to load {}", older.display()))?;
            newer_schema.difference(&older_schema)
        }
        None => SchemaDiff::everything(&newer_schema),
    };
    let Some(diff) = diff else {
        bail!("No new tables; there is nothing to sample");
    };

    let suite = &config.runner.baseline_suite;
    let starting_id = config
        .suite(suite)
        .and_then(|s| s.test_set(TestCategory::SelectAll.test_set_name()))
        .map_or(1, |t| t.effective_starting_id(config.revisions.is_first_revision()));

    let layout = OutputLayout::new(&config.runner.output_dir);
    let samples = extract_baseline_samples(&layout, suite, starting_id, &diff)
        .context("Failed to extract samples from the baseline run")?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }

    for table in samples.tables() {
        print_header(&table.name);
        println!("{}", sample_table(table));
    }
    Ok(())
}
