//! SQLite dialect.

use std::sync::LazyLock;

use super::{limit_offset, quote_with, DatabaseEngine, Dialect};
use crate::formatter::{ConcatPipes, Param, RuleSet, SqlFormatter};

static FUNCTIONS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(
        "sqlite",
        r"(?i)\b(?P<now>NOW|GETDATE)\s*\(\s*\)",
    )
    .rule(&[Param::Group("now")], |_| "CURRENT_TIMESTAMP".to_string())
    .build()
    .expect("sqlite rule pattern compiles")
});

/// SQLite: double-quoted identifiers, `@name` parameters and `LIMIT`
/// paging.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Sqlite
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
        "INSTR"
    }

    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String {
        limit_offset(sql, take, skip, order_by, Some("-1"))
    }

    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        vec![&ConcatPipes, &*FUNCTIONS]
    }
}
