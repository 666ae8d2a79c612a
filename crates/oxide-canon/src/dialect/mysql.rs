//! MySQL dialect.

use std::sync::LazyLock;

use super::{limit_offset, quote_with, DatabaseEngine, Dialect, MutationStyle};
use crate::formatter::{Param, RuleSet, SqlFormatter};

/// The largest row count MySQL accepts, used when only an offset is given.
const ALL_ROWS: &str = "18446744073709551615";

static FUNCTIONS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder("mysql", r"(?i)\b(?P<now>GETDATE)\s*\(\s*\)")
        .rule(&[Param::Group("now")], |_| "NOW()".to_string())
        .build()
        .expect("mysql rule pattern compiles")
});

/// MySQL: backtick identifiers, `?name` parameters, `LIMIT` paging and
/// join-target updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::MySql
    }

    fn name(&self, identifier: &str) -> String {
        quote_with(identifier, '`', '`')
    }

    fn parameter_name(&self, name: &str) -> String {
        format!("?{name}")
    }

    fn index_of(&self) -> &'static str {
        "LOCATE"
    }

    fn index_of_swap_places(&self) -> bool {
        true
    }

    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String {
        limit_offset(sql, take, skip, order_by, Some(ALL_ROWS))
    }

    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        vec![&*FUNCTIONS]
    }

    fn mutation_style(&self) -> MutationStyle {
        MutationStyle::InlineJoin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        let d = MySqlDialect::new();
        assert_eq!(d.name("order"), "`order`");
        assert_eq!(d.parameter_name("id"), "?id");
        assert_eq!(d.index_of(), "LOCATE");
    }

    #[test]
    fn test_paged() {
        let d = MySqlDialect::new();
        assert_eq!(
            d.paged("SELECT 1", Some(10), 20, Some("`a`")),
            "SELECT 1 ORDER BY `a` LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            d.paged("SELECT 1", None, 20, None),
            "SELECT 1 LIMIT 18446744073709551615 OFFSET 20"
        );
    }

    #[test]
    fn test_rules() {
        assert_eq!(FUNCTIONS.format("SELECT getdate()").unwrap(), "SELECT NOW()");
    }
}
