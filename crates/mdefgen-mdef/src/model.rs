//! In-memory schema entities: SQL types, columns, tables, stored procedures.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SQL Types
// ============================================================================

/// ODBC SQL type of a column, as named in metadata and result documents.
///
/// Names are accepted with or without the `SQL_` prefix. Unrecognized names
/// are kept verbatim in [`SqlType::Other`] so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SqlType {
    Char,
    VarChar,
    LongVarChar,
    WChar,
    WVarChar,
    WLongVarChar,
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    TypeDate,
    TypeTime,
    TypeTimestamp,
    Guid,
    Binary,
    VarBinary,
    LongVarBinary,
    Other(String),
}

/// How a sampled value of a given type is rendered as a SQL literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// Single-quoted string literal.
    Quoted,
    /// `1` / `0`.
    Boolean,
    /// Bare integer.
    Integer,
    /// Bare floating point number.
    Double,
}

impl SqlType {
    /// Parses a type name such as `SQL_WVARCHAR` or `WVARCHAR`.
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        let upper = trimmed.to_ascii_uppercase();
        let bare = upper.strip_prefix("SQL_").unwrap_or(&upper);

        match bare {
            "CHAR" => Self::Char,
            "VARCHAR" => Self::VarChar,
            "LONGVARCHAR" => Self::LongVarChar,
            "WCHAR" => Self::WChar,
            "WVARCHAR" => Self::WVarChar,
            "WLONGVARCHAR" => Self::WLongVarChar,
            "BIT" => Self::Bit,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "INTEGER" => Self::Integer,
            "BIGINT" => Self::BigInt,
            "REAL" => Self::Real,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "NUMERIC" => Self::Numeric,
            "TYPE_DATE" => Self::TypeDate,
            "TYPE_TIME" => Self::TypeTime,
            "TYPE_TIMESTAMP" => Self::TypeTimestamp,
            "GUID" => Self::Guid,
            "BINARY" => Self::Binary,
            "VARBINARY" => Self::VarBinary,
            "LONGVARBINARY" => Self::LongVarBinary,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Returns the canonical `SQL_`-prefixed name.
    pub fn name(&self) -> &str {
        match self {
            Self::Char => "SQL_CHAR",
            Self::VarChar => "SQL_VARCHAR",
            Self::LongVarChar => "SQL_LONGVARCHAR",
            Self::WChar => "SQL_WCHAR",
            Self::WVarChar => "SQL_WVARCHAR",
            Self::WLongVarChar => "SQL_WLONGVARCHAR",
            Self::Bit => "SQL_BIT",
            Self::TinyInt => "SQL_TINYINT",
            Self::SmallInt => "SQL_SMALLINT",
            Self::Integer => "SQL_INTEGER",
            Self::BigInt => "SQL_BIGINT",
            Self::Real => "SQL_REAL",
            Self::Float => "SQL_FLOAT",
            Self::Double => "SQL_DOUBLE",
            Self::Decimal => "SQL_DECIMAL",
            Self::Numeric => "SQL_NUMERIC",
            Self::TypeDate => "SQL_TYPE_DATE",
            Self::TypeTime => "SQL_TYPE_TIME",
            Self::TypeTimestamp => "SQL_TYPE_TIMESTAMP",
            Self::Guid => "SQL_GUID",
            Self::Binary => "SQL_BINARY",
            Self::VarBinary => "SQL_VARBINARY",
            Self::LongVarBinary => "SQL_LONGVARBINARY",
            Self::Other(name) => name,
        }
    }

    /// Returns how values of this type are written as SQL literals.
    pub fn literal_kind(&self) -> LiteralKind {
        match self {
            Self::Bit => LiteralKind::Boolean,
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt => LiteralKind::Integer,
            Self::Real | Self::Float | Self::Double => LiteralKind::Double,
            _ => LiteralKind::Quoted,
        }
    }
}

impl From<String> for SqlType {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<&str> for SqlType {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<SqlType> for String {
    fn from(sql_type: SqlType) -> Self {
        sql_type.name().to_string()
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Columns and Access Rules
// ============================================================================

/// A table or result-set column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    /// Eligible for filter-pushdown testing.
    pub passdownable: bool,
}

impl Column {
    /// Creates a non-passdownable column.
    pub fn new(name: impl Into<String>, sql_type: impl Into<SqlType>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            passdownable: false,
        }
    }

    /// Marks the column as passdownable.
    pub fn passdownable(mut self) -> Self {
        self.passdownable = true;
        self
    }
}

/// API operation a table exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApiAccess {
    Read,
    Create,
    Update,
    Delete,
}

impl ApiAccess {
    /// Maps a metadata key (`ReadAPI`, ...) to an access kind.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ReadAPI" => Some(Self::Read),
            "CreateAPI" => Some(Self::Create),
            "UpdateAPI" => Some(Self::Update),
            "DeleteAPI" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the metadata key for this access kind.
    pub fn key(self) -> &'static str {
        match self {
            Self::Read => "ReadAPI",
            Self::Create => "CreateAPI",
            Self::Update => "UpdateAPI",
            Self::Delete => "DeleteAPI",
        }
    }
}

/// An access rule with the columns the API call requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub access: ApiAccess,
    pub required_columns: Vec<String>,
}

// ============================================================================
// Tables and Stored Procedures
// ============================================================================

/// A table or flattened virtual table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
    pub access_rules: Vec<AccessRule>,
    pub is_virtual: bool,
}

impl Table {
    /// Creates a base table with no access rules.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            access_rules: Vec::new(),
            is_virtual: false,
        }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns a column by declaration position.
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the columns eligible for pushdown testing.
    pub fn passdownable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.passdownable)
    }

    /// Returns the access rule for `access`, if the table exposes it.
    pub fn access_rule(&self, access: ApiAccess) -> Option<&AccessRule> {
        self.access_rules.iter().find(|r| r.access == access)
    }
}

/// A stored procedure. `result_columns` is empty when the metadata declares
/// no result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub name: String,
    pub result_columns: Vec<Column>,
}

impl StoredProcedure {
    /// Creates a procedure with no declared result columns.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result_columns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SQL_WVARCHAR", SqlType::WVarChar; "prefixed")]
    #[test_case("WVARCHAR", SqlType::WVarChar; "bare")]
    #[test_case("sql_integer", SqlType::Integer; "lowercase")]
    #[test_case(" SQL_TYPE_TIMESTAMP ", SqlType::TypeTimestamp; "padded")]
    #[test_case("SQL_INTERVAL_DAY", SqlType::Other("SQL_INTERVAL_DAY".to_string()); "unknown")]
    fn test_sql_type_from_name(name: &str, expected: SqlType) {
        assert_eq!(SqlType::from_name(name), expected);
    }

    #[test_case(SqlType::WVarChar, LiteralKind::Quoted)]
    #[test_case(SqlType::TypeTimestamp, LiteralKind::Quoted)]
    #[test_case(SqlType::Bit, LiteralKind::Boolean)]
    #[test_case(SqlType::Integer, LiteralKind::Integer)]
    #[test_case(SqlType::BigInt, LiteralKind::Integer)]
    #[test_case(SqlType::Double, LiteralKind::Double)]
    #[test_case(SqlType::Decimal, LiteralKind::Quoted)]
    #[test_case(SqlType::Other("SQL_FOO".to_string()), LiteralKind::Quoted)]
    fn test_literal_kind(sql_type: SqlType, expected: LiteralKind) {
        assert_eq!(sql_type.literal_kind(), expected);
    }

    #[test]
    fn test_sql_type_name_round_trip() {
        assert_eq!(SqlType::from_name(SqlType::WLongVarChar.name()), SqlType::WLongVarChar);
        assert_eq!(SqlType::Other("X_TYPE".to_string()).to_string(), "X_TYPE");
    }

    #[test]
    fn test_api_access_keys() {
        for access in [ApiAccess::Read, ApiAccess::Create, ApiAccess::Update, ApiAccess::Delete] {
            assert_eq!(ApiAccess::from_key(access.key()), Some(access));
        }
        assert_eq!(ApiAccess::from_key("ExecuteAPI"), None);
    }

    #[test]
    fn test_table_lookups() {
        let table = Table::new(
            "Accounts",
            vec![
                Column::new("Id", SqlType::Integer).passdownable(),
                Column::new("Name", SqlType::WVarChar),
            ],
        );

        assert_eq!(table.column("Name").map(|c| &c.sql_type), Some(&SqlType::WVarChar));
        assert_eq!(table.column_at(0).map(|c| c.name.as_str()), Some("Id"));
        assert!(table.column("Missing").is_none());
        assert_eq!(table.column_names().collect::<Vec<_>>(), ["Id", "Name"]);
        assert_eq!(table.passdownable_columns().count(), 1);
    }
}
