//! Oracle dialect.

use std::sync::LazyLock;

use super::{quote_with, with_order, DatabaseEngine, Dialect};
use crate::formatter::{ConcatPipes, Param, RuleSet, SqlFormatter};

static FUNCTIONS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(
        "oracle",
        r"(?i)\b(?:(?P<now>NOW|GETDATE)\s*\(\s*\)|(?P<true>TRUE)\b|(?P<false>FALSE)\b)",
    )
    .rule(&[Param::Group("now")], |_| "SYSDATE".to_string())
    .rule(&[Param::Text("true")], |_| "1".to_string())
    .rule(&[Param::Text("false")], |_| "0".to_string())
    .build()
    .expect("oracle rule pattern compiles")
});

/// Oracle 12c+: double-quoted identifiers, `:name` parameters,
/// `OFFSET ... FETCH` paging and `DUAL` for table-less selects.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl OracleDialect {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Oracle
    }

    fn name(&self, identifier: &str) -> String {
        quote_with(identifier, '"', '"')
    }

    fn parameter_name(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn substring(&self) -> &'static str {
        "SUBSTR"
    }

    fn index_of(&self) -> &'static str {
        "INSTR"
    }

    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String {
        let mut out = with_order(sql, order_by);
        if skip > 0 {
            out.push_str(&format!(" OFFSET {skip} ROWS"));
            if let Some(n) = take {
                out.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
            }
        } else if let Some(n) = take {
            out.push_str(&format!(" FETCH FIRST {n} ROWS ONLY"));
        }
        out
    }

    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        vec![&ConcatPipes, &*FUNCTIONS]
    }

    fn dual_table(&self) -> Option<&'static str> {
        Some("DUAL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(sql: &str) -> String {
        OracleDialect::new()
            .formatters()
            .into_iter()
            .try_fold(sql.to_string(), |text, f| f.format(&text))
            .unwrap()
    }

    #[test]
    fn test_quoting() {
        let d = OracleDialect::new();
        assert_eq!(d.name("users"), "\"users\"");
        assert_eq!(d.parameter_name("id"), ":id");
        assert_eq!(d.substring(), "SUBSTR");
        assert_eq!(d.dual_table(), Some("DUAL"));
    }

    #[test]
    fn test_paged() {
        let d = OracleDialect::new();
        assert_eq!(d.paged("SELECT 1", Some(1), 0, None), "SELECT 1 FETCH FIRST 1 ROWS ONLY");
        assert_eq!(
            d.paged("SELECT 1", Some(2), 5, Some("\"a\"")),
            "SELECT 1 ORDER BY \"a\" OFFSET 5 ROWS FETCH NEXT 2 ROWS ONLY"
        );
    }

    #[test]
    fn test_rules() {
        assert_eq!(
            render("SELECT CONCAT('%', \"a\", '%'), NOW() WHERE \"b\" = TRUE"),
            "SELECT ('%' || \"a\" || '%'), SYSDATE WHERE \"b\" = 1"
        );
        assert_eq!(
            render("WHERE \"a\" LIKE CONCAT('%', LOWER(\"a\"), '%') AND \"true\" = FALSE"),
            "WHERE \"a\" LIKE ('%' || LOWER(\"a\") || '%') AND \"true\" = 0"
        );
    }
}
