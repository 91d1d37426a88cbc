//! Metadata document parsing and the flattened [`Schema`].
//!
//! Virtual tables are flattened depth-first: each virtual table is appended
//! right after its parent (and its parent's earlier virtual subtrees), so the
//! flat table order is a pre-order walk of the declaration tree. Later stages
//! correlate diff entries with baseline results by this position.

use crate::model::{AccessRule, ApiAccess, Column, SqlType, StoredProcedure, Table};
use crate::{MdefError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

const IN_MEMORY_SOURCE: &str = "<memory>";

// ============================================================================
// Raw Document Shape
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDocument {
    #[serde(default)]
    stored_procedures: Option<Vec<RawProcedure>>,
    tables: Vec<RawTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProcedure {
    name: String,
    #[serde(default)]
    result_table: Option<RawResultTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResultTable {
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTable {
    table_name: String,
    columns: Vec<RawColumn>,
    #[serde(rename = "APIAccess", default)]
    api_access: BTreeMap<String, Option<RawAccess>>,
    #[serde(default)]
    virtual_tables: Vec<RawTable>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAccess {
    #[serde(default)]
    column_requirements: Option<Vec<RawRequirement>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Named(String),
    Entry {
        #[serde(rename = "Name", alias = "ColumnName")]
        name: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawColumn {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default)]
    parent_column: Option<RawParentColumn>,
    #[serde(default)]
    passdownable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "SQLType")]
    sql_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawParentColumn {
    Index(usize),
    Text(String),
}

// ============================================================================
// Schema
// ============================================================================

/// One parsed metadata instance.
///
/// Immutable after construction. Holds the flattened table list and two
/// derived indexes: passdownable columns per table and the virtual table names.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    source_name: String,
    tables: Vec<Table>,
    procedures: Vec<StoredProcedure>,
    passdownable: HashMap<String, Vec<String>>,
    virtual_tables: HashSet<String>,
}

impl Schema {
    /// Loads and parses a metadata file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MdefError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse_named(&content, &path.display().to_string())
    }

    /// Parses a metadata document held in memory.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_named(content, IN_MEMORY_SOURCE)
    }

    fn parse_named(content: &str, source_name: &str) -> Result<Self> {
        let raw: RawDocument =
            serde_json::from_str(content).map_err(|e| MdefError::Malformed {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        let resolver = Resolver { source_name };
        let procedures = resolver.procedures(raw.stored_procedures.unwrap_or_default())?;
        let tables = resolver.tables(&raw.tables)?;

        debug!(
            source = source_name,
            tables = tables.len(),
            procedures = procedures.len(),
            "parsed metadata"
        );

        Ok(Self::from_parts(source_name, tables, procedures))
    }

    /// Builds a schema from already-resolved tables and procedures.
    ///
    /// Table names are assumed unique; the derived indexes are rebuilt.
    pub fn from_parts(
        source_name: impl Into<String>,
        tables: Vec<Table>,
        procedures: Vec<StoredProcedure>,
    ) -> Self {
        let passdownable = tables
            .iter()
            .filter_map(|t| {
                let columns: Vec<String> =
                    t.passdownable_columns().map(|c| c.name.clone()).collect();
                (!columns.is_empty()).then(|| (t.name.clone(), columns))
            })
            .collect();

        let virtual_tables = tables
            .iter()
            .filter(|t| t.is_virtual)
            .map(|t| t.name.clone())
            .collect();

        Self {
            source_name: source_name.into(),
            tables,
            procedures,
            passdownable,
            virtual_tables,
        }
    }

    /// Returns where this schema came from (a path or `<memory>`).
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns all tables, virtual tables flattened depth-first.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Returns all stored procedures in declaration order.
    pub fn procedures(&self) -> &[StoredProcedure] {
        &self.procedures
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn contains_procedure(&self, name: &str) -> bool {
        self.procedures.iter().any(|p| p.name == name)
    }

    /// Returns the passdownable column names of `table` (empty if none).
    pub fn passdownable_columns(&self, table: &str) -> &[String] {
        self.passdownable.get(table).map_or(&[], Vec::as_slice)
    }

    pub fn is_virtual(&self, table: &str) -> bool {
        self.virtual_tables.contains(table)
    }

    /// Returns the virtual table names in schema order.
    pub fn virtual_table_names(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|t| t.is_virtual)
            .map(|t| t.name.as_str())
    }
}

// ============================================================================
// Resolution
// ============================================================================

struct Resolver<'a> {
    source_name: &'a str,
}

impl Resolver<'_> {
    fn malformed(&self, reason: impl Into<String>) -> MdefError {
        MdefError::Malformed {
            source_name: self.source_name.to_string(),
            reason: reason.into(),
        }
    }

    fn procedures(&self, raw: Vec<RawProcedure>) -> Result<Vec<StoredProcedure>> {
        raw.into_iter()
            .map(|p| {
                let result_columns = match p.result_table {
                    Some(table) => table
                        .columns
                        .iter()
                        .map(|c| self.declared_column(c, &p.name))
                        .collect::<Result<_>>()?,
                    None => Vec::new(),
                };
                Ok(StoredProcedure {
                    name: p.name,
                    result_columns,
                })
            })
            .collect()
    }

    /// Flattens the table tree into declaration pre-order.
    ///
    /// Each pending virtual table carries the index of its already-resolved
    /// parent in the output list; `ParentColumn` is an index into that
    /// parent's column sequence.
    fn tables(&self, raw: &[RawTable]) -> Result<Vec<Table>> {
        let mut out: Vec<Table> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for root in raw {
            let mut pending: Vec<(&RawTable, Option<usize>)> = vec![(root, None)];

            while let Some((node, parent)) = pending.pop() {
                if !seen.insert(node.table_name.clone()) {
                    return Err(MdefError::DuplicateName {
                        source_name: self.source_name.to_string(),
                        name: node.table_name.clone(),
                    });
                }

                let table = self.table(node, parent.map(|i| &out[i]))?;
                let index = out.len();
                out.push(table);

                for child in node.virtual_tables.iter().rev() {
                    pending.push((child, Some(index)));
                }
            }
        }

        Ok(out)
    }

    fn table(&self, node: &RawTable, parent: Option<&Table>) -> Result<Table> {
        let columns = node
            .columns
            .iter()
            .map(|c| match (&c.parent_column, parent) {
                (Some(key), Some(parent)) => self.inherited_column(c, key, parent, &node.table_name),
                (Some(_), None) => Err(self.malformed(format!(
                    "table {} uses ParentColumn but is not a virtual table",
                    node.table_name
                ))),
                (None, _) => self.declared_column(c, &node.table_name),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut access_rules: Vec<AccessRule> = node
            .api_access
            .iter()
            .filter_map(|(key, access)| {
                let kind = ApiAccess::from_key(key)?;
                let required_columns = access
                    .as_ref()
                    .and_then(|a| a.column_requirements.as_ref())
                    .map(|reqs| {
                        reqs.iter()
                            .map(|r| match r {
                                RawRequirement::Named(name) | RawRequirement::Entry { name } => {
                                    name.clone()
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(AccessRule {
                    access: kind,
                    required_columns,
                })
            })
            .collect();
        access_rules.sort_by_key(|r| r.access);

        Ok(Table {
            name: node.table_name.clone(),
            columns,
            access_rules,
            is_virtual: parent.is_some(),
        })
    }

    fn declared_column(&self, raw: &RawColumn, owner: &str) -> Result<Column> {
        let name = raw
            .name
            .as_ref()
            .ok_or_else(|| self.malformed(format!("column without Name in {owner}")))?;
        let metadata = raw
            .metadata
            .as_ref()
            .ok_or_else(|| self.malformed(format!("column {owner}.{name} has no Metadata")))?;

        Ok(Column {
            name: name.clone(),
            sql_type: SqlType::from_name(&metadata.sql_type),
            passdownable: raw.passdownable.unwrap_or(false),
        })
    }

    fn inherited_column(
        &self,
        raw: &RawColumn,
        key: &RawParentColumn,
        parent: &Table,
        owner: &str,
    ) -> Result<Column> {
        let index = match key {
            RawParentColumn::Index(i) => *i,
            RawParentColumn::Text(s) => s.trim().parse().map_err(|_| {
                self.malformed(format!("invalid ParentColumn {s:?} in {owner}"))
            })?,
        };

        let source = parent.column_at(index).ok_or_else(|| {
            self.malformed(format!(
                "ParentColumn {index} of {owner} is out of range for parent {} ({} columns)",
                parent.name,
                parent.columns.len()
            ))
        })?;

        Ok(Column {
            name: source.name.clone(),
            sql_type: source.sql_type.clone(),
            passdownable: raw.passdownable.unwrap_or(false),
        })
    }
}
