//! SQL dialect support.
//!
//! Canonical SQL is engine-neutral. A [`Dialect`] supplies everything needed
//! to turn it into SQL one engine accepts: identifier and parameter quoting,
//! builtin function names, the paging template, the UPDATE/DELETE statement
//! shape and an ordered list of text rewrites.

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;

use std::fmt;
use std::str::FromStr;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::error::SqlError;
use crate::formatter::SqlFormatter;

/// The database engines with a built-in dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseEngine {
    /// Microsoft SQL Server.
    SqlServer,
    /// MySQL and MariaDB.
    MySql,
    /// Oracle 12c and later.
    Oracle,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl DatabaseEngine {
    /// All engines, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::SqlServer,
        Self::MySql,
        Self::Oracle,
        Self::Postgres,
        Self::Sqlite,
    ];

    /// Returns the short lower-case engine name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::MySql => "mysql",
            Self::Oracle => "oracle",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the built-in dialect for this engine.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::SqlServer => &SqlServerDialect,
            Self::MySql => &MySqlDialect,
            Self::Oracle => &OracleDialect,
            Self::Postgres => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Ok(Self::SqlServer),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "oracle" => Ok(Self::Oracle),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(SqlError::unsupported(format!("unknown dialect `{other}`"))),
        }
    }
}

/// How an engine spells UPDATE and DELETE statements that alias their
/// target or join other tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStyle {
    /// `UPDATE x SET ... FROM t x JOIN ...` and `DELETE x FROM t x JOIN ...`.
    FromClause,
    /// `UPDATE t x JOIN ... SET ...` and `DELETE x FROM t x JOIN ...`.
    InlineJoin,
    /// `UPDATE t x SET ... FROM o y WHERE ...` and `DELETE FROM t x USING o y`.
    UsingClause,
    /// `UPDATE t x SET ... WHERE ...`; joined mutations are not supported.
    Inline,
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the engine this dialect targets.
    fn engine(&self) -> DatabaseEngine;

    /// Quotes a single identifier.
    fn name(&self, identifier: &str) -> String;

    /// Renders a bound parameter reference.
    fn parameter_name(&self, name: &str) -> String;

    /// Name of the string length builtin.
    fn length(&self) -> &'static str {
        "LENGTH"
    }

    /// Name of the substring builtin.
    fn substring(&self) -> &'static str {
        "SUBSTRING"
    }

    /// Name of the string search builtin.
    fn index_of(&self) -> &'static str;

    /// Whether the search builtin takes `(needle, haystack)` instead of the
    /// canonical `(haystack, needle)`.
    fn index_of_swap_places(&self) -> bool {
        false
    }

    /// Appends ordering and paging to a complete `SELECT` statement.
    ///
    /// `order_by` is the ordering list without the `ORDER BY` keyword. With
    /// no `take` and no `skip` only the ordering is appended.
    fn paged(&self, sql: &str, take: Option<u64>, skip: u64, order_by: Option<&str>) -> String;

    /// Text rewrites run in order after token quoting.
    fn formatters(&self) -> Vec<&'static dyn SqlFormatter> {
        Vec::new()
    }

    /// The UPDATE/DELETE statement shape.
    fn mutation_style(&self) -> MutationStyle {
        MutationStyle::Inline
    }

    /// The table a FROM-less `SELECT` must read from, if any.
    fn dual_table(&self) -> Option<&'static str> {
        None
    }
}

/// Wraps `identifier` in `open`/`close`, doubling any embedded `close`.
pub(crate) fn quote_with(identifier: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(identifier.len() + 2);
    out.push(open);
    for c in identifier.chars() {
        if c == close {
            out.push(close);
        }
        out.push(c);
    }
    out.push(close);
    out
}

/// Appends ` ORDER BY <order_by>` when an ordering is present.
pub(crate) fn with_order(sql: &str, order_by: Option<&str>) -> String {
    match order_by {
        Some(order) if !order.trim().is_empty() => format!("{sql} ORDER BY {order}"),
        _ => sql.to_string(),
    }
}

/// `LIMIT n OFFSET s` paging shared by the engines that support it.
///
/// `unbounded` is the LIMIT value used when only an offset is requested;
/// `None` omits the LIMIT clause entirely in that case.
pub(crate) fn limit_offset(
    sql: &str,
    take: Option<u64>,
    skip: u64,
    order_by: Option<&str>,
    unbounded: Option<&str>,
) -> String {
    let mut out = with_order(sql, order_by);
    match (take, unbounded) {
        (Some(n), _) => out.push_str(&format!(" LIMIT {n}")),
        (None, Some(all)) if skip > 0 => out.push_str(&format!(" LIMIT {all}")),
        _ => {}
    }
    if skip > 0 {
        out.push_str(&format!(" OFFSET {skip}"));
    }
    out
}

/// ANSI `OFFSET s ROWS FETCH NEXT n ROWS ONLY` paging.
pub(crate) fn offset_fetch(sql: &str, take: Option<u64>, skip: u64, order_by: &str) -> String {
    let mut out = format!("{sql} ORDER BY {order_by} OFFSET {skip} ROWS");
    if let Some(n) = take {
        out.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_str() {
        assert_eq!("MSSQL".parse::<DatabaseEngine>().unwrap(), DatabaseEngine::SqlServer);
        assert_eq!("pg".parse::<DatabaseEngine>().unwrap(), DatabaseEngine::Postgres);
        assert!("access".parse::<DatabaseEngine>().is_err());
    }

    #[test]
    fn test_every_engine_has_a_dialect() {
        for engine in DatabaseEngine::ALL {
            assert_eq!(engine.dialect().engine(), engine);
            assert_eq!(engine.to_string().parse::<DatabaseEngine>().unwrap(), engine);
        }
    }

    #[test]
    fn test_quote_with_escapes_closing_quote() {
        assert_eq!(quote_with("a]b", '[', ']'), "[a]]b]");
        assert_eq!(quote_with("a\"b", '"', '"'), "\"a\"\"b\"");
    }

    #[test]
    fn test_limit_offset() {
        assert_eq!(limit_offset("S", Some(5), 0, None, None), "S LIMIT 5");
        assert_eq!(
            limit_offset("S", None, 3, Some("a"), Some("-1")),
            "S ORDER BY a LIMIT -1 OFFSET 3"
        );
        assert_eq!(limit_offset("S", None, 3, None, None), "S OFFSET 3");
        assert_eq!(limit_offset("S", None, 0, None, Some("-1")), "S");
    }
}
