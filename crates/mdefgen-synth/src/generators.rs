//! Category-specific SQL query synthesis.
//!
//! Every generator walks the diff tables (or their samples) in diff order and
//! returns plain `SELECT` text. A table that yields nothing under a rule is
//! skipped; only SELECT_TOP treats a wholly unsampled table as an error.
//!
//! Random choices go through the injected [`Rng`], so a fixed seed gives the
//! exact same statements.

use crate::category::TestCategory;
use crate::rng::Rng;
use crate::sample::{ColumnSample, SampleMap, SampleValue};
use crate::{Result, SynthError};
use mdefgen_mdef::SchemaDiff;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Aggregates used for numeric columns.
pub const AGGREGATE_FUNCTIONS: [&str; 5] = ["MAX", "MIN", "COUNT", "SUM", "AVG"];

/// Functions used for textual columns.
pub const TEXT_FUNCTIONS: [&str; 3] = ["UCASE", "LCASE", "COUNT"];

/// Wildcard appended after the LIKE character.
const LIKE_SUFFIXES: [&str; 3] = ["_", "%", ""];

/// Column-name fragments excluded from function synthesis.
const ID_FRAGMENTS: [&str; 2] = ["id", "index"];

/// Quoted timestamp literal, e.g. `'2024-01-31 10:20:30.000'`.
static TIMESTAMP_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^'(\d+)-(\d+)-(\d+) (\d+):(\d+):(\d+).(\d+)'").expect("timestamp pattern is valid")
});

/// A stored procedure invocation configured for the SP category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub name: String,
    /// Argument list, written verbatim between the parentheses.
    pub args: String,
}

impl ProcedureCall {
    pub fn new(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: args.into(),
        }
    }
}

/// Everything a generator may draw from.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub diff: &'a SchemaDiff,
    pub samples: Option<&'a SampleMap>,
    pub suite: &'a str,
    pub procedures: &'a [ProcedureCall],
}

fn is_id_like(column: &str) -> bool {
    let lower = column.to_lowercase();
    ID_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

/// Column index used by ORDER_BY and COLUMNS_1TABLE.
fn bounded_index<R: Rng>(rng: &mut R, column_count: usize) -> usize {
    let bound = column_count % 10;
    if bound > 1 { rng.next_usize(bound - 1) } else { 0 }
}

/// Synthesizes test queries for each category.
#[derive(Debug)]
pub struct QuerySynthesizer<R: Rng> {
    rng: R,
}

impl<R: Rng> QuerySynthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Dispatches to the generator bound to `category`.
    pub fn generate(&mut self, category: TestCategory, input: &SynthesisInput<'_>) -> Result<Vec<String>> {
        if category == TestCategory::StoredProcedure {
            return stored_procedures(input.suite, input.procedures);
        }
        if category == TestCategory::SelectAll {
            return Ok(select_all(input.diff));
        }

        let samples = input.samples.ok_or(SynthError::MissingSamples)?;
        let queries = match category {
            TestCategory::Passdown => passdown(input.diff, samples),
            TestCategory::SelectTop => self.select_top(samples)?,
            TestCategory::AndOr => and_or(samples),
            TestCategory::OrderBy => self.order_by(samples),
            TestCategory::Columns1Table => self.columns_1table(samples),
            TestCategory::GroupBy => group_by(samples),
            TestCategory::InBetween => self.in_between(samples),
            TestCategory::Like => self.like(samples),
            TestCategory::Function1Table => self.function_1table(samples),
            TestCategory::SelectAll | TestCategory::StoredProcedure => Vec::new(),
        };

        debug!(%category, queries = queries.len(), "synthesized queries");
        Ok(queries)
    }

    /// `SELECT TOP n` ordered by the first column, with `*` or that column.
    ///
    /// `n` is the largest per-column sample size modulo 25.
    pub fn select_top(&mut self, samples: &SampleMap) -> Result<Vec<String>> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            let row_count = table.max_values();
            if row_count == 0 {
                return Err(SynthError::EmptySample {
                    table: table.name.clone(),
                });
            }
            let Some(column) = table.columns.first() else {
                continue;
            };
            let top = row_count % 25;
            let projection = if self.rng.next_bool() { "*" } else { column.name.as_str() };
            queries.push(format!(
                "SELECT TOP {top} {projection} FROM {} ORDER BY {}",
                table.name, column.name
            ));
        }
        Ok(queries)
    }

    pub fn order_by(&mut self, samples: &SampleMap) -> Vec<String> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            let index = bounded_index(&mut self.rng, table.columns.len());
            let Some(column) = table.columns.get(index) else {
                continue;
            };
            let projection = if self.rng.next_bool() { "*" } else { column.name.as_str() };
            queries.push(format!(
                "SELECT {projection} FROM {} ORDER BY {}",
                table.name, column.name
            ));
        }
        queries
    }

    /// Projects one column, always ordered by the first.
    pub fn columns_1table(&mut self, samples: &SampleMap) -> Vec<String> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            let index = bounded_index(&mut self.rng, table.columns.len());
            let (Some(first), Some(column)) = (table.columns.first(), table.columns.get(index)) else {
                continue;
            };
            queries.push(format!(
                "SELECT {} FROM {} ORDER BY {}",
                column.name, table.name, first.name
            ));
        }
        queries
    }

    /// `IN (a, b)` over the first column with more than two values, one of them text.
    pub fn in_between(&mut self, samples: &SampleMap) -> Vec<String> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            let candidate = table
                .columns
                .iter()
                .find(|c| c.values.len() > 2 && c.values.iter().any(SampleValue::is_text));
            let Some(column) = candidate else {
                continue;
            };
            let Some((a, b)) = self.rng.pick_two(column.values.len()) else {
                continue;
            };
            let projection = if column.values.len() % 2 == 0 { "*" } else { column.name.as_str() };
            queries.push(format!(
                "SELECT {projection} FROM {table} WHERE {column} IN ({}, {})",
                column.values[a],
                column.values[b],
                table = table.name,
                column = column.name,
            ));
        }
        queries
    }

    /// `LIKE '%<c><wildcard>'` built from an interior character of the
    /// first value of a column. Only the first value of each column is
    /// considered; a numeric first value ends the search for its table.
    pub fn like(&mut self, samples: &SampleMap) -> Vec<String> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            for column in &table.columns {
                let Some(value) = column.first() else {
                    continue;
                };
                if !value.is_text() && !value.is_numeric() {
                    continue;
                }

                let literal: Vec<char> = value.literal().chars().collect();
                if literal.len() > 2 {
                    let picked = literal[1 + self.rng.next_usize(literal.len() - 2)];
                    let picked = if picked == '\'' { "''".to_string() } else { picked.to_string() };
                    let suffix = self.rng.choose(&LIKE_SUFFIXES).copied().unwrap_or_default();
                    queries.push(format!(
                        "SELECT {column} FROM {} WHERE {column} LIKE '%{picked}{suffix}'",
                        table.name,
                        column = column.name,
                    ));
                    break;
                }
                if value.is_numeric() {
                    break;
                }
            }
        }
        queries
    }

    /// Aggregates over numeric columns and at most one text function per
    /// table. ID-like columns are never used.
    pub fn function_1table(&mut self, samples: &SampleMap) -> Vec<String> {
        let mut queries = Vec::new();
        for table in samples.tables() {
            let mut text_written = false;
            for column in &table.columns {
                if is_id_like(&column.name) || column.values.is_empty() {
                    continue;
                }
                if column.values.iter().all(SampleValue::is_numeric) {
                    let op = self.rng.choose(&AGGREGATE_FUNCTIONS).copied().unwrap_or("COUNT");
                    queries.push(format!(
                        "SELECT {op}({}) AS {op}_OF_{} FROM {}",
                        column.name,
                        column.name.to_uppercase(),
                        table.name
                    ));
                    break;
                }
                if !text_written && is_plain_text(column) {
                    let op = self.rng.choose(&TEXT_FUNCTIONS).copied().unwrap_or("COUNT");
                    queries.push(format!("SELECT {op}({}) FROM {}", column.name, table.name));
                    text_written = true;
                }
            }
        }
        queries
    }
}

fn is_plain_text(column: &ColumnSample) -> bool {
    column
        .values
        .iter()
        .all(|v| v.is_text() && !TIMESTAMP_LITERAL.is_match(&v.literal()))
}

/// One `SELECT *` per diff table.
pub fn select_all(diff: &SchemaDiff) -> Vec<String> {
    diff.table_names().map(|name| format!("SELECT * FROM {name}")).collect()
}

/// One equality filter per passdownable column, using its first sampled value.
pub fn passdown(diff: &SchemaDiff, samples: &SampleMap) -> Vec<String> {
    let mut queries = Vec::new();
    for table in &diff.tables {
        let Some(sample) = samples.table(&table.name) else {
            continue;
        };
        for column in table.passdownable_columns() {
            if let Some(value) = sample.column(&column.name).and_then(ColumnSample::first) {
                queries.push(format!(
                    "SELECT * FROM {} WHERE {} = {value}",
                    table.name, column.name
                ));
            }
        }
    }
    queries
}

/// Joins the first values of the first two columns holding at least two
/// values. Even table positions use AND, odd ones OR.
pub fn and_or(samples: &SampleMap) -> Vec<String> {
    let mut queries = Vec::new();
    for (index, table) in samples.tables().iter().enumerate() {
        let joiner = if index % 2 == 0 { "AND" } else { "OR" };
        let predicates: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.values.len() >= 2)
            .take(2)
            .map(|c| format!("{} = {}", c.name, c.values[0]))
            .collect();
        if let [left, right] = predicates.as_slice() {
            queries.push(format!("SELECT * FROM {} WHERE {left} {joiner} {right}", table.name));
        }
    }
    queries
}

/// `GROUP BY … HAVING` on the first sampled column, falling back to
/// `GROUP BY … ORDER BY` on the last column when nothing was sampled.
pub fn group_by(samples: &SampleMap) -> Vec<String> {
    let mut queries = Vec::new();
    for table in samples.tables() {
        if let Some((column, value)) = table
            .columns
            .iter()
            .find_map(|c| c.first().map(|v| (c, v)))
        {
            queries.push(format!(
                "SELECT {column} FROM {} GROUP BY {column} HAVING {column} = {value}",
                table.name,
                column = column.name,
            ));
        } else if let Some(column) = table.columns.last() {
            queries.push(format!(
                "SELECT {column} FROM {} GROUP BY {column} ORDER BY {column}",
                table.name,
                column = column.name,
            ));
        }
    }
    queries
}

/// One `{call name(args)}` per configured procedure.
pub fn stored_procedures(suite: &str, procedures: &[ProcedureCall]) -> Result<Vec<String>> {
    if procedures.is_empty() {
        return Err(SynthError::MissingProcedures {
            suite: suite.to_string(),
        });
    }
    Ok(procedures
        .iter()
        .map(|p| format!("{{call {}({})}}", p.name, p.args))
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
