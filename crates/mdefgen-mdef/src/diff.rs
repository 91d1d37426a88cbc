//! Structural difference between two schema versions.
//!
//! The diff answers "is this table new", not "did this table change": a table
//! whose columns were altered under an unchanged name is not reported.

use crate::model::{StoredProcedure, Table};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tables and stored procedures present in a newer schema but absent, by
/// name, from an older one. Both lists keep the newer schema's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub tables: Vec<Table>,
    pub procedures: Vec<StoredProcedure>,
}

impl SchemaDiff {
    /// Treats every table and procedure of `schema` as new.
    ///
    /// Used when there is no previous revision to compare against.
    pub fn everything(schema: &Schema) -> Option<Self> {
        Self::non_empty(schema.tables().to_vec(), schema.procedures().to_vec())
    }

    fn non_empty(tables: Vec<Table>, procedures: Vec<StoredProcedure>) -> Option<Self> {
        if tables.is_empty() {
            return None;
        }
        Some(Self { tables, procedures })
    }

    /// Returns the table names in diff order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

/// Computes what `newer` adds over `older`.
///
/// Returns `None` when no table is new; that is the normal "nothing to
/// generate" stop, not an error.
pub fn diff(newer: &Schema, older: &Schema) -> Option<SchemaDiff> {
    let tables: Vec<Table> = newer
        .tables()
        .iter()
        .filter(|t| !older.contains_table(&t.name))
        .cloned()
        .collect();

    let procedures: Vec<StoredProcedure> = newer
        .procedures()
        .iter()
        .filter(|p| !older.contains_procedure(&p.name))
        .cloned()
        .collect();

    debug!(
        newer = newer.source_name(),
        older = older.source_name(),
        new_tables = tables.len(),
        new_procedures = procedures.len(),
        "computed schema difference"
    );

    SchemaDiff::non_empty(tables, procedures)
}

impl Schema {
    /// Computes what `self` adds over `older`. See [`diff`].
    pub fn difference(&self, older: &Schema) -> Option<SchemaDiff> {
        diff(self, older)
    }
}
