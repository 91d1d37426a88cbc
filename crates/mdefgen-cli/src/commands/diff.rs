//! `diff`: compare two local metadata files.

use anyhow::{Context, Result};
use mdefgen_mdef::Schema;
use std::path::Path;

use crate::style::{print_header, print_labeled, print_warn};

pub fn run(newer: &Path, older: &Path, format: &str) -> Result<()> {
    let newer_schema = Schema::load(newer)
        .with_context(|| format!("Failed to load {}", newer.display()))?;
    let older_schema = Schema::load(older)
        .with_context(|| format!("Failed to load {}", older.display()))?;

    let Some(diff) = newer_schema.difference(&older_schema) else {
        if format == "json" {
            println!("null");
        } else {
            print_warn("No new tables");
        }
        return Ok(());
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }

    print_header(&format!("New tables ({})", diff.tables.len()));
    for table in &diff.tables {
        let kind = if table.is_virtual { "virtual, " } else { "" };
        print_labeled(&table.name, &format!("{kind}{} columns", table.columns.len()));
    }
    if !diff.procedures.is_empty() {
        print_header(&format!("New stored procedures ({})", diff.procedures.len()));
        for procedure in &diff.procedures {
            println!("  {}", procedure.name);
        }
    }
    Ok(())
}
