//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use mdefgen_harness::{CategoryOutcome, PipelineReport};
use mdefgen_synth::TableSample;

fn styled_table(columns: &[&str]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col).add_attribute(Attribute::Bold).fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);
    table
}

fn outcome_cell(outcome: &CategoryOutcome) -> Cell {
    let (text, color) = match outcome {
        CategoryOutcome::Written { queries } => (format!("{queries} queries"), Color::Green),
        CategoryOutcome::Empty => ("no queries".to_string(), Color::Yellow),
        CategoryOutcome::Failed(reason) => (format!("failed: {reason}"), Color::Red),
        CategoryOutcome::Skipped => ("skipped (unknown test set)".to_string(), Color::DarkGrey),
    };
    if super::no_color() {
        Cell::new(text)
    } else {
        Cell::new(text).fg(color)
    }
}

/// One row per configured test set.
pub fn report_table(report: &PipelineReport) -> Table {
    let mut table = styled_table(&["Suite", "Test set", "Outcome"]);
    for category in &report.categories {
        table.add_row(vec![
            Cell::new(&category.suite),
            Cell::new(&category.test_set),
            outcome_cell(&category.outcome),
        ]);
    }
    table
}

/// One row per sampled column.
pub fn sample_table(sample: &TableSample) -> Table {
    let mut table = styled_table(&["Column", "Type", "Values"]);
    for column in &sample.columns {
        let values: Vec<String> = column.values.iter().map(ToString::to_string).collect();
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(column.sql_type.name()),
            Cell::new(values.join(", ")),
        ]);
    }
    table
}
