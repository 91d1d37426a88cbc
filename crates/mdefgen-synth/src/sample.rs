//! Sampled column values harvested from baseline results.

use crate::result::ResultDocument;
use crate::{Result, SynthError};
use mdefgen_mdef::{LiteralKind, SqlType, Table};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Upper bound (exclusive) on the number of rows sampled per table.
pub const MAX_SAMPLED_ROWS: usize = 30;

/// A typed value observed in a baseline result.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    /// Anything rendered as a quoted string literal. Holds the raw, unquoted text.
    Text(String),
    Boolean(bool),
    Integer(i128),
    Double(f64),
}

impl SampleValue {
    /// Parses raw cell text according to the column's declared type.
    pub fn parse(raw: &str, sql_type: &SqlType) -> std::result::Result<Self, String> {
        match sql_type.literal_kind() {
            LiteralKind::Quoted => Ok(Self::Text(raw.to_string())),
            LiteralKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(Self::Boolean(true)),
                "0" | "false" => Ok(Self::Boolean(false)),
                _ => Err(format!("{raw:?} is not a {sql_type} value")),
            },
            LiteralKind::Integer => raw
                .parse()
                .map(Self::Integer)
                .map_err(|_| format!("{raw:?} is not a {sql_type} value")),
            LiteralKind::Double => raw
                .parse()
                .map(Self::Double)
                .map_err(|_| format!("{raw:?} is not a {sql_type} value")),
        }
    }

    /// Renders the value as a SQL literal.
    pub fn literal(&self) -> String {
        match self {
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Double(d) => format!("{d:?}"),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// True for integer and double values. Booleans are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Double(_))
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.literal())
    }
}

/// Distinct values observed for one column, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSample {
    pub name: String,
    pub sql_type: SqlType,
    pub values: Vec<SampleValue>,
}

impl ColumnSample {
    pub fn first(&self) -> Option<&SampleValue> {
        self.values.first()
    }
}

/// Sampled columns of one table, in result-document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSample {
    pub name: String,
    pub columns: Vec<ColumnSample>,
}

impl TableSample {
    pub fn column(&self, name: &str) -> Option<&ColumnSample> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Largest number of distinct values held by any column.
    pub fn max_values(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.max_values() == 0
    }
}

/// Table name to column samples, in diff order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SampleMap {
    tables: Vec<TableSample>,
}

impl SampleMap {
    /// Builds the sample map from one result document per diff table.
    ///
    /// `results[i]` must be the `SELECT *` result of `tables[i]`.
    pub fn extract(tables: &[Table], results: &[ResultDocument]) -> Result<Self> {
        if let Some(table) = tables.get(results.len()) {
            return Err(SynthError::ResultMismatch {
                table: table.name.clone(),
                reason: format!(
                    "{} result documents for {} tables",
                    results.len(),
                    tables.len()
                ),
            });
        }

        let tables = tables
            .iter()
            .zip(results)
            .map(|(table, result)| sample_table(table, result))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tables })
    }

    pub fn from_tables(tables: Vec<TableSample>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[TableSample] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSample> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn mismatch(table: &Table, reason: impl Into<String>) -> SynthError {
    SynthError::ResultMismatch {
        table: table.name.clone(),
        reason: reason.into(),
    }
}

fn sample_table(table: &Table, result: &ResultDocument) -> Result<TableSample> {
    if result.description_blocks > 1 {
        return Err(mismatch(
            table,
            format!("{} RowDescriptions blocks, expected one", result.description_blocks),
        ));
    }
    if result.columns.len() != table.columns.len() {
        return Err(mismatch(
            table,
            format!(
                "result has {} columns, metadata has {}",
                result.columns.len(),
                table.columns.len()
            ),
        ));
    }
    let mut names = HashSet::with_capacity(result.columns.len());
    for column in &result.columns {
        if table.column(&column.name).is_none() {
            return Err(mismatch(table, format!("unknown column {}", column.name)));
        }
        if !names.insert(column.name.as_str()) {
            return Err(mismatch(table, format!("duplicate column {}", column.name)));
        }
    }

    let sampled_rows = (result.row_count % MAX_SAMPLED_ROWS).min(result.rows.len());
    let rows = &result.rows[..sampled_rows];

    let mut columns = Vec::with_capacity(result.columns.len());
    for (index, column) in result.columns.iter().enumerate() {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for raw in rows.iter().filter_map(|row| row.get(index).cloned().flatten()) {
            let value = SampleValue::parse(&raw, &column.sql_type).map_err(|reason| {
                mismatch(table, format!("column {}: {reason}", column.name))
            })?;
            if seen.insert(value.literal()) {
                values.push(value);
            }
        }
        columns.push(ColumnSample {
            name: column.name.clone(),
            sql_type: column.sql_type.clone(),
            values,
        });
    }

    debug!(
        table = %table.name,
        rows = sampled_rows,
        columns = columns.len(),
        "sampled baseline result"
    );

    Ok(TableSample {
        name: table.name.clone(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ResultColumn;
    use mdefgen_mdef::Column;
    use test_case::test_case;

    fn table() -> Table {
        Table::new(
            "T1",
            vec![
                Column::new("colA", SqlType::Integer),
                Column::new("colB", SqlType::WVarChar),
            ],
        )
    }

    fn result(row_count: usize, rows: &[[Option<&str>; 2]]) -> ResultDocument {
        ResultDocument {
            columns: vec![
                ResultColumn { name: "colA".into(), sql_type: SqlType::Integer },
                ResultColumn { name: "colB".into(), sql_type: SqlType::WVarChar },
            ],
            row_count,
            description_blocks: 1,
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        }
    }

    #[test_case("abc", SqlType::WVarChar, "'abc'")]
    #[test_case("O'Neil", SqlType::WVarChar, "'O''Neil'")]
    #[test_case("2024-01-01 10:00:00.000", SqlType::TypeTimestamp, "'2024-01-01 10:00:00.000'")]
    #[test_case("true", SqlType::Bit, "1")]
    #[test_case("0", SqlType::Bit, "0")]
    #[test_case("-42", SqlType::Integer, "-42")]
    #[test_case("18446744073709551615", SqlType::BigInt, "18446744073709551615")]
    #[test_case("3", SqlType::Double, "3.0")]
    #[test_case("2.5", SqlType::Double, "2.5")]
    #[test_case("x", SqlType::Other("SQL_WEIRD".into()), "'x'")]
    fn test_literal_formatting(raw: &str, sql_type: SqlType, expected: &str) {
        assert_eq!(SampleValue::parse(raw, &sql_type).unwrap().literal(), expected);
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        assert!(SampleValue::parse("abc", &SqlType::Integer).is_err());
        assert!(SampleValue::parse("maybe", &SqlType::Bit).is_err());
    }

    #[test]
    fn test_extract_dedups_and_skips_nulls() {
        let doc = result(
            4,
            &[
                [Some("1"), Some("x")],
                [Some("1"), None],
                [None, Some("x")],
                [Some("2"), Some("y")],
            ],
        );
        let map = SampleMap::extract(&[table()], &[doc]).unwrap();
        let sample = map.table("T1").unwrap();

        let literals = |name: &str| -> Vec<String> {
            sample.column(name).unwrap().values.iter().map(SampleValue::literal).collect()
        };
        assert_eq!(literals("colA"), ["1", "2"]);
        assert_eq!(literals("colB"), ["'x'", "'y'"]);
        assert_eq!(sample.max_values(), 2);
    }

    #[test]
    fn test_row_count_is_reduced_modulo_thirty() {
        let rows: Vec<[Option<&str>; 2]> = vec![[Some("1"), Some("a")], [Some("2"), Some("b")]];

        // 31 % 30 == 1
        let map = SampleMap::extract(&[table()], &[result(31, &rows)]).unwrap();
        assert_eq!(map.table("T1").unwrap().max_values(), 1);

        // 30 % 30 == 0: the table is kept, with nothing sampled
        let map = SampleMap::extract(&[table()], &[result(30, &rows)]).unwrap();
        assert!(map.table("T1").unwrap().is_empty());
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut doc = result(1, &[[Some("1"), Some("a")]]);
        doc.columns.pop();
        assert!(matches!(
            SampleMap::extract(&[table()], &[doc]),
            Err(SynthError::ResultMismatch { ref table, .. }) if table == "T1"
        ));
    }

    #[test]
    fn test_column_name_mismatch() {
        let mut doc = result(1, &[[Some("1"), Some("a")]]);
        doc.columns[1].name = "colZ".into();
        assert!(matches!(
            SampleMap::extract(&[table()], &[doc]),
            Err(SynthError::ResultMismatch { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_mismatch() {
        let mut doc = result(1, &[[Some("1"), Some("2")]]);
        doc.columns[1] = ResultColumn { name: "colA".into(), sql_type: SqlType::Integer };
        assert!(matches!(
            SampleMap::extract(&[table()], &[doc]),
            Err(SynthError::ResultMismatch { ref reason, .. }) if reason.contains("duplicate column colA")
        ));
    }

    #[test]
    fn test_multiple_row_descriptions_mismatch() {
        let mut doc = result(1, &[[Some("1"), Some("a")]]);
        doc.description_blocks = 2;
        assert!(matches!(
            SampleMap::extract(&[table()], &[doc]),
            Err(SynthError::ResultMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_result_document() {
        assert!(matches!(
            SampleMap::extract(&[table()], &[]),
            Err(SynthError::ResultMismatch { .. })
        ));
    }

    #[test]
    fn test_serializes_literals() {
        let map = SampleMap::extract(&[table()], &[result(1, &[[Some("7"), Some("it's")]])]).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json[0]["columns"][0]["values"][0], "7");
        assert_eq!(json[0]["columns"][1]["values"][0], "'it''s'");
    }
}
