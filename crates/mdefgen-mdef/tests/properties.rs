//! Property-based tests for schema parsing and diffing.

use mdefgen_mdef::{Column, Schema, SqlType, StoredProcedure, Table, diff};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TYPES: [&str; 5] = [
    "SQL_INTEGER",
    "SQL_WVARCHAR",
    "SQL_DOUBLE",
    "SQL_BIT",
    "SQL_TYPE_TIMESTAMP",
];

fn table_strategy(name: String) -> impl Strategy<Value = Table> {
    prop::collection::vec((0..TYPES.len(), any::<bool>()), 1..5).prop_map(move |cols| {
        Table::new(
            name.clone(),
            cols.into_iter()
                .enumerate()
                .map(|(i, (ty, passdown))| {
                    let column = Column::new(format!("col{i}"), SqlType::from_name(TYPES[ty]));
                    if passdown { column.passdownable() } else { column }
                })
                .collect(),
        )
    })
}

fn schema_strategy() -> impl Strategy<Value = Schema> {
    (
        prop::collection::btree_set("[A-Z][a-z]{1,6}", 1..6),
        prop::collection::btree_set("sp_[a-z]{1,6}", 0..3),
    )
        .prop_flat_map(|(names, procs): (BTreeSet<String>, BTreeSet<String>)| {
            let tables: Vec<_> = names.into_iter().map(table_strategy).collect();
            (tables, Just(procs))
        })
        .prop_map(|(tables, procs)| {
            Schema::from_parts(
                "generated",
                tables,
                procs.into_iter().map(StoredProcedure::bare).collect(),
            )
        })
}

fn document(parent_types: &[usize], picks: &[usize]) -> String {
    let parent_columns: Vec<String> = parent_types
        .iter()
        .enumerate()
        .map(|(i, t)| format!(r#"{{ "Name": "p{i}", "Metadata": {{ "SQLType": "{}" }} }}"#, TYPES[*t]))
        .collect();
    let virtual_columns: Vec<String> = picks
        .iter()
        .map(|p| format!(r#"{{ "ParentColumn": {p} }}"#))
        .collect();

    format!(
        r#"{{ "Tables": [ {{
            "TableName": "Parent",
            "Columns": [ {} ],
            "VirtualTables": [ {{ "TableName": "Child", "Columns": [ {} ] }} ]
        }} ] }}"#,
        parent_columns.join(", "),
        virtual_columns.join(", ")
    )
}

proptest! {
    /// A schema never differs from itself.
    #[test]
    fn test_diff_with_self_is_none(schema in schema_strategy()) {
        prop_assert!(diff(&schema, &schema).is_none());
    }

    /// A table missing from the older schema appears verbatim in the diff.
    #[test]
    fn test_new_table_appears_verbatim(schema in schema_strategy(), extra in table_strategy("Zz_new".to_string())) {
        let mut tables = schema.tables().to_vec();
        tables.push(extra.clone());
        let newer = Schema::from_parts("newer", tables, schema.procedures().to_vec());

        let d = diff(&newer, &schema).expect("new table must produce a diff");
        let found = d.tables.iter().find(|t| t.name == "Zz_new");
        prop_assert_eq!(found, Some(&extra));
        prop_assert_eq!(d.tables.len(), 1);
    }

    /// Resolving ParentColumn references is stable across repeated parses.
    #[test]
    fn test_parent_column_resolution_is_idempotent(
        parent_types in prop::collection::vec(0..TYPES.len(), 1..6),
        raw_picks in prop::collection::vec(any::<prop::sample::Index>(), 1..4),
    ) {
        let picks: Vec<usize> = raw_picks.iter().map(|i| i.index(parent_types.len())).collect();
        let doc = document(&parent_types, &picks);

        let first = Schema::parse(&doc).unwrap();
        let second = Schema::parse(&doc).unwrap();
        prop_assert_eq!(&first, &second);

        let parent = first.table("Parent").unwrap();
        let child = first.table("Child").unwrap();
        for (column, pick) in child.columns.iter().zip(&picks) {
            let source = &parent.columns[*pick];
            prop_assert_eq!(&column.name, &source.name);
            prop_assert_eq!(&column.sql_type, &source.sql_type);
        }
    }
}
