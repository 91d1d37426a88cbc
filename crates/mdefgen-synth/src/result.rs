//! Parsing of baseline result documents.
//!
//! A result document describes its columns with `<Column>` elements (first
//! child holds the name, second child carries a `Type` attribute) and holds
//! its rows under a `<RowDescriptions RowCount="n">` element. A well-formed
//! result has exactly one; extra blocks are counted but not read:
//!
//! ```xml
//! <ResultSet>
//!   <Columns>
//!     <Column><Name>Id</Name><SqlType Type="SQL_INTEGER"/></Column>
//!   </Columns>
//!   <RowDescriptions RowCount="1">
//!     <Row><Value>7</Value></Row>
//!   </RowDescriptions>
//! </ResultSet>
//! ```

use crate::{Result, SynthError};
use mdefgen_mdef::SqlType;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::path::Path;

/// A column as reported by the result document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub sql_type: SqlType,
}

/// One parsed baseline result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDocument {
    pub columns: Vec<ResultColumn>,
    /// The `RowCount` attribute, which may exceed `rows.len()`.
    pub row_count: usize,
    /// Number of `RowDescriptions` blocks seen.
    pub description_blocks: usize,
    /// Cells in column order; `None` for null cells.
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultDocument {
    /// Loads and parses a result document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SynthError::NotFound(path.to_path_buf()));
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Parses a result document held in memory.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut parser = ResultParser::default();
        let mut depth = 0usize;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    parser.open(&e, depth)?;
                }
                Ok(Event::Empty(e)) => {
                    depth += 1;
                    parser.open(&e, depth)?;
                    parser.close(depth)?;
                    depth -= 1;
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(to_malformed)?;
                    parser.text(&text);
                }
                Ok(Event::CData(t)) => {
                    parser.text(&String::from_utf8_lossy(&t.into_inner()));
                }
                Ok(Event::End(_)) => {
                    parser.close(depth)?;
                    depth = depth.saturating_sub(1);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(to_malformed(e)),
                _ => {}
            }
        }

        parser.finish()
    }
}

fn to_malformed(err: impl std::fmt::Display) -> SynthError {
    SynthError::MalformedResult(err.to_string())
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(to_malformed)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value().map_err(to_malformed)?.into_owned()));
        }
    }
    Ok(None)
}

fn is_null_marker(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v.eq_ignore_ascii_case("true") || v == "1"
    })
}

#[derive(Debug)]
struct ColumnState {
    depth: usize,
    children: usize,
    capturing_name: bool,
    name: String,
    sql_type: Option<String>,
}

#[derive(Debug)]
struct CellState {
    null: bool,
    text: String,
}

#[derive(Debug, Default)]
struct ResultParser {
    columns: Vec<ResultColumn>,
    column: Option<ColumnState>,
    descriptions: usize,
    rows_depth: Option<usize>,
    row_count: Option<usize>,
    rows: Vec<Vec<Option<String>>>,
    row: Option<Vec<Option<String>>>,
    cell: Option<CellState>,
}

impl ResultParser {
    fn open(&mut self, e: &BytesStart<'_>, depth: usize) -> Result<()> {
        if let Some(rows_depth) = self.rows_depth {
            if depth == rows_depth + 1 {
                self.row = Some(Vec::new());
            } else if depth == rows_depth + 2 && self.row.is_some() {
                let null = is_null_marker(attr_value(e, b"IsNull")?.as_deref());
                self.cell = Some(CellState {
                    null,
                    text: String::new(),
                });
            }
            return Ok(());
        }

        match e.name().as_ref() {
            b"RowDescriptions" => {
                self.descriptions += 1;
                if self.descriptions > 1 {
                    return Ok(());
                }
                let raw = attr_value(e, b"RowCount")?.ok_or_else(|| {
                    SynthError::MalformedResult("RowDescriptions without RowCount".to_string())
                })?;
                let count = raw.trim().parse().map_err(|_| {
                    SynthError::MalformedResult(format!("invalid RowCount {raw:?}"))
                })?;
                self.row_count = Some(count);
                self.rows_depth = Some(depth);
            }
            b"Column" if self.column.is_none() => {
                self.column = Some(ColumnState {
                    depth,
                    children: 0,
                    capturing_name: false,
                    name: String::new(),
                    sql_type: None,
                });
            }
            _ => {
                if let Some(column) = self.column.as_mut() {
                    if depth == column.depth + 1 {
                        match column.children {
                            0 => column.capturing_name = true,
                            1 => column.sql_type = attr_value(e, b"Type")?,
                            _ => {}
                        }
                        column.children += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(text);
        } else if let Some(column) = self.column.as_mut() {
            if column.capturing_name {
                column.name.push_str(text);
            }
        }
    }

    fn close(&mut self, depth: usize) -> Result<()> {
        if let Some(rows_depth) = self.rows_depth {
            if depth == rows_depth + 2 {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    let text = cell.text.trim();
                    let empty = text.is_empty() || text == "none";
                    row.push((!cell.null && !empty).then(|| text.to_string()));
                }
            } else if depth == rows_depth + 1 {
                if let Some(row) = self.row.take() {
                    self.rows.push(row);
                }
            } else if depth == rows_depth {
                self.rows_depth = None;
            }
            return Ok(());
        }

        if let Some(column) = self.column.as_mut() {
            if depth == column.depth + 1 {
                column.capturing_name = false;
            } else if depth == column.depth {
                let Some(column) = self.column.take() else {
                    return Ok(());
                };
                let name = column.name.trim().to_string();
                if name.is_empty() {
                    return Err(SynthError::MalformedResult(
                        "Column element without a name".to_string(),
                    ));
                }
                let sql_type = column.sql_type.as_deref().map_or_else(
                    || SqlType::Other(String::new()),
                    SqlType::from_name,
                );
                self.columns.push(ResultColumn { name, sql_type });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<ResultDocument> {
        let row_count = self.row_count.ok_or_else(|| {
            SynthError::MalformedResult("result has no RowDescriptions block".to_string())
        })?;
        Ok(ResultDocument {
            columns: self.columns,
            row_count,
            description_blocks: self.descriptions,
            rows: self.rows,
        })
    }
}
