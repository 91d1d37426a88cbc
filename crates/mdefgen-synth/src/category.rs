//! Test categories and the test-set names that select them.

use std::fmt;

/// One kind of generated test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestCategory {
    SelectAll,
    Passdown,
    SelectTop,
    AndOr,
    OrderBy,
    Columns1Table,
    GroupBy,
    InBetween,
    Like,
    Function1Table,
    StoredProcedure,
}

impl TestCategory {
    pub const ALL: [TestCategory; 11] = [
        Self::SelectAll,
        Self::Passdown,
        Self::SelectTop,
        Self::AndOr,
        Self::OrderBy,
        Self::Columns1Table,
        Self::GroupBy,
        Self::InBetween,
        Self::Like,
        Self::Function1Table,
        Self::StoredProcedure,
    ];

    /// Resolves a configured test-set name, including its aliases.
    pub fn from_test_set_name(name: &str) -> Option<Self> {
        let category = match name.trim() {
            "SQL_SELECT_ALL" => Self::SelectAll,
            "SQL_PASSDOWN" => Self::Passdown,
            "SQL_SELECT_TOP" => Self::SelectTop,
            "SQL_AND_OR" => Self::AndOr,
            "SQL_ORDER_BY" | "SQL_ORDER" => Self::OrderBy,
            "COLUMNS_1TABLE" | "SQL_COLUMNS_1TABLE" => Self::Columns1Table,
            "SQL_GROUP_BY" => Self::GroupBy,
            "SQL_IN_BETWEEN" => Self::InBetween,
            "SQL_LIKE" => Self::Like,
            "SQL_FUNCTION_1TABLE" => Self::Function1Table,
            "SQL_SP" => Self::StoredProcedure,
            _ => return None,
        };
        Some(category)
    }

    /// The canonical test-set name.
    pub fn test_set_name(self) -> &'static str {
        match self {
            Self::SelectAll => "SQL_SELECT_ALL",
            Self::Passdown => "SQL_PASSDOWN",
            Self::SelectTop => "SQL_SELECT_TOP",
            Self::AndOr => "SQL_AND_OR",
            Self::OrderBy => "SQL_ORDER_BY",
            Self::Columns1Table => "COLUMNS_1TABLE",
            Self::GroupBy => "SQL_GROUP_BY",
            Self::InBetween => "SQL_IN_BETWEEN",
            Self::Like => "SQL_LIKE",
            Self::Function1Table => "SQL_FUNCTION_1TABLE",
            Self::StoredProcedure => "SQL_SP",
        }
    }

    /// Whether the category is synthesized from sampled values.
    pub fn needs_samples(self) -> bool {
        !matches!(self, Self::SelectAll | Self::StoredProcedure)
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.test_set_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("SQL_ORDER_BY", TestCategory::OrderBy)]
    #[test_case("SQL_ORDER", TestCategory::OrderBy)]
    #[test_case("COLUMNS_1TABLE", TestCategory::Columns1Table)]
    #[test_case("SQL_COLUMNS_1TABLE", TestCategory::Columns1Table)]
    #[test_case("SQL_SP", TestCategory::StoredProcedure)]
    fn test_aliases(name: &str, expected: TestCategory) {
        assert_eq!(TestCategory::from_test_set_name(name), Some(expected));
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for category in TestCategory::ALL {
            assert_eq!(TestCategory::from_test_set_name(category.test_set_name()), Some(category));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(TestCategory::from_test_set_name("SQL_JOIN"), None);
    }

    #[test]
    fn test_needs_samples() {
        assert!(!TestCategory::SelectAll.needs_samples());
        assert!(!TestCategory::StoredProcedure.needs_samples());
        assert!(TestCategory::Like.needs_samples());
    }
}
