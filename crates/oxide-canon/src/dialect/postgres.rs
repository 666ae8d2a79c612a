//! PostgreSQL dialect.

use std::sync::LazyLock;

use super::{limit_offset, quote_with, DatabaseEngine, Dialect, MutationStyle};
use crate::formatter::{Param, RuleSet, SqlFormatter};

static FUNCTIONS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(
        "postgres",
        r"(?i)\b(?:(?P<now>GETDATE)\s*\(\s*\)|(?P<coalesce>ISNULL|IFNULL|NVL)\s*\()",
    )
    .rule(&[Param::Group("now")], |_| "NOW()".to_string())
    .rule(&[Param::Group("coalesce")], |_| "COALESCE(".to_string())
    .build()
    .expect("postgres rule pattern compiles")
});

/// PostgreSQL: double-quoted identifiers, `@name` parameters, `LIMIT`
/// paging and `UPDATE ... FROM` / `DELETE ... USING` mutations.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Postgres
    }

    fn name(&self, identifier: &str) -> String {
        quote_with(identifier, '"', '"')
    }

    fn parameter_name(&self, name: &str) -> String {
        format!("@{name}")
    }

    fn substring(&self) -> &'static str {
        "SUBSTR"
    }

    fn index_of(&self) -> &'static str {
        "STRPOS"
    }

    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String {
        limit_offset(sql, take, skip, order_by, None)
    }

    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        vec![&*FUNCTIONS]
    }

    fn mutation_style(&self) -> MutationStyle {
        MutationStyle::UsingClause
    }
}
