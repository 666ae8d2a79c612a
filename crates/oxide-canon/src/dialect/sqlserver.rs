//! Microsoft SQL Server dialect.

use std::sync::LazyLock;

use super::{offset_fetch, quote_with, with_order, DatabaseEngine, Dialect, MutationStyle};
use crate::formatter::{Param, RuleSet, SqlFormatter};

static FUNCTIONS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(
        "sqlserver",
        r"(?i)\b(?:(?P<now>NOW)\s*\(\s*\)|(?P<coalesce>IFNULL|NVL)\s*\(|(?P<true>TRUE)\b|(?P<false>FALSE)\b)",
    )
    .rule(&[Param::Group("now")], |_| "GETDATE()".to_string())
    .rule(&[Param::Group("coalesce")], |_| "ISNULL(".to_string())
    .rule(&[Param::Text("true")], |_| "1".to_string())
    .rule(&[Param::Text("false")], |_| "0".to_string())
    .build()
    .expect("sqlserver rule pattern compiles")
});

/// SQL Server: `[name]` identifiers, `@name` parameters, `TOP` and
/// `OFFSET ... FETCH` paging.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Inserts `TOP(n)` after the leading `SELECT [DISTINCT]`.
fn insert_top(sql: &str, n: u64) -> Option<String> {
    let upper = sql.get(..16).unwrap_or(sql).to_ascii_uppercase();
    let head = if upper.starts_with("SELECT DISTINCT ") {
        16
    } else if upper.starts_with("SELECT ") {
        7
    } else {
        return None;
    };
    Some(format!("{}TOP({n}) {}", &sql[..head], &sql[head..]))
}

impl Dialect for SqlServerDialect {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::SqlServer
    }

    fn name(&self, identifier: &str) -> String {
        quote_with(identifier, '[', ']')
    }

    fn parameter_name(&self, name: &str) -> String {
        format!("@{name}")
    }

    fn length(&self) -> &'static str {
        "LEN"
    }

    fn index_of(&self) -> &'static str {
        "CHARINDEX"
    }

    fn index_of_swap_places(&self) -> bool {
        true
    }

    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String {
        match (take, skip) {
            (None, 0) => with_order(sql, order_by),
            (Some(n), 0) => match insert_top(sql, n) {
                Some(top) => with_order(&top, order_by),
                None => offset_fetch(sql, take, skip, order_by.unwrap_or("(SELECT 0)")),
            },
            _ => offset_fetch(sql, take, skip, order_by.unwrap_or("(SELECT 0)")),
        }
    }

    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        vec![&*FUNCTIONS]
    }

    fn mutation_style(&self) -> MutationStyle {
        MutationStyle::FromClause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        let d = SqlServerDialect::new();
        assert_eq!(d.name("users"), "[users]");
        assert_eq!(d.parameter_name("id"), "@id");
        assert_eq!(d.length(), "LEN");
        assert!(d.index_of_swap_places());
    }

    #[test]
    fn test_paged_top() {
        let d = SqlServerDialect::new();
        assert_eq!(
            d.paged("SELECT DISTINCT [a] FROM [t]", Some(5), 0, Some("[a]")),
            "SELECT DISTINCT TOP(5) [a] FROM [t] ORDER BY [a]"
        );
    }

    #[test]
    fn test_paged_offset_without_order() {
        let d = SqlServerDialect::new();
        assert_eq!(
            d.paged("SELECT [a] FROM [t]", Some(5), 10, None),
            "SELECT [a] FROM [t] ORDER BY (SELECT 0) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(
            d.paged("SELECT [a] FROM [t]", None, 10, Some("[a] DESC")),
            "SELECT [a] FROM [t] ORDER BY [a] DESC OFFSET 10 ROWS"
        );
    }

    #[test]
    fn test_rules() {
        let sql = "SELECT NOW(), IFNULL([a], 0), NVL([b], 1) WHERE [c] = TRUE AND 'TRUE' <> FALSE";
        assert_eq!(
            FUNCTIONS.format(sql).unwrap(),
            "SELECT GETDATE(), ISNULL([a], 0), ISNULL([b], 1) WHERE [c] = 1 AND 'TRUE' <> 0"
        );
    }
}
