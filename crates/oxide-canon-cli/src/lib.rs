//! Command-line front end for canonical SQL.
//!
//! `oxide-canon` reads hand-written SQL from a file or standard input,
//! normalizes it into canonical SQL, and reports what it found or renders it
//! for a database engine.
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the canonical form
//! oxide-canon analyze query.sql
//!
//! # List the referenced tables and parameters
//! oxide-canon tables query.sql
//! oxide-canon params query.sql
//!
//! # Render for PostgreSQL, reading from stdin
//! cat query.sql | oxide-canon --dialect postgres format
//!
//! # Everything at once, as JSON
//! oxide-canon --json analyze query.sql
//! ```

pub mod error;

use std::io::Read;
use std::path::Path;

use oxide_canon::{analyze, analyze_parameters, analyze_tables, format, DatabaseEngine, TableToken};
use serde::Serialize;
use tracing::debug;

pub use error::{CliError, Result};

/// What to report about the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The canonical SQL.
    Analyze,
    /// The table references.
    Tables,
    /// The parameter names.
    Params,
    /// The SQL rendered for a dialect.
    Format,
}

/// A table reference as reported by `tables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    /// Statement kind that owns the reference (`SELECT`, `JOIN`, ...).
    pub command: String,
    /// Table name, possibly schema-qualified.
    pub name: String,
}

impl From<&TableToken> for TableEntry {
    fn from(token: &TableToken) -> Self {
        Self {
            command: token.command.to_string(),
            name: token.name.clone(),
        }
    }
}

/// Everything known about one input.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Canonical SQL.
    pub canonical: String,
    /// Table references, deduplicated.
    pub tables: Vec<TableEntry>,
    /// Parameter names, in first-use order.
    pub parameters: Vec<String>,
    /// Target engine, when the SQL was rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    /// SQL rendered for `dialect`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

impl Report {
    /// Analyzes `sql`, rendering it for `engine` as well when given.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::EmptyInput`] for blank input and
    /// [`CliError::Sql`] when the SQL cannot be analyzed or formatted.
    pub fn build(sql: &str, engine: Option<DatabaseEngine>) -> Result<Self> {
        if sql.trim().is_empty() {
            return Err(CliError::EmptyInput);
        }
        let canonical = analyze(sql)?;
        let tables: Vec<TableEntry> = analyze_tables(&canonical)
            .iter()
            .map(TableEntry::from)
            .collect();
        let parameters = analyze_parameters(&canonical);
        let formatted = engine
            .map(|engine| format(&canonical, engine.dialect()))
            .transpose()?;
        debug!(
            tables = tables.len(),
            parameters = parameters.len(),
            "analyzed input"
        );
        Ok(Self {
            canonical,
            tables,
            parameters,
            dialect: engine.map(|e| e.to_string()),
            formatted,
        })
    }
}

/// Reads SQL from `path`, or from standard input when `path` is `None` or
/// `-`.
///
/// # Errors
///
/// Returns [`CliError::Read`] or [`CliError::Stdin`] on IO failure.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            debug!(path = %path.display(), "reading input file");
            std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => {
            let mut sql = String::new();
            std::io::stdin()
                .read_to_string(&mut sql)
                .map_err(CliError::Stdin)?;
            Ok(sql)
        }
    }
}

/// Runs `action` on `sql` and returns the text to print.
///
/// Plain output prints one item per line; `json` prints the requested part
/// of the [`Report`] as pretty JSON (the whole report for
/// [`Action::Analyze`]).
///
/// # Errors
///
/// Returns the first analysis, formatting or serialization error.
pub fn run(action: Action, sql: &str, engine: DatabaseEngine, json: bool) -> Result<String> {
    let render = action == Action::Format || (json && action == Action::Analyze);
    let report = Report::build(sql, render.then_some(engine))?;

    if json {
        let value = match action {
            Action::Analyze => serde_json::to_value(&report)?,
            Action::Tables => serde_json::to_value(&report.tables)?,
            Action::Params => serde_json::to_value(&report.parameters)?,
            Action::Format => serde_json::json!({
                "dialect": report.dialect,
                "sql": report.formatted,
            }),
        };
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    Ok(match action {
        Action::Analyze => report.canonical,
        Action::Tables => report
            .tables
            .iter()
            .map(|t| format!("{}\t{}", t.command, t.name))
            .collect::<Vec<_>>()
            .join("\n"),
        Action::Params => report.parameters.join("\n"),
        Action::Format => report.formatted.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SQL: &str = "SELECT u.name FROM users u JOIN orders o ON o.user_id = u.id WHERE u.id = :id";

    #[test]
    fn test_report_collects_everything() {
        let report = Report::build(SQL, None).unwrap();
        assert!(report.canonical.contains("{SELECT#users}"));
        assert_eq!(
            report.tables,
            vec![
                TableEntry {
                    command: "SELECT".into(),
                    name: "users".into()
                },
                TableEntry {
                    command: "JOIN".into(),
                    name: "orders".into()
                },
            ]
        );
        assert_eq!(report.parameters, vec!["id".to_string()]);
        assert!(report.formatted.is_none());
    }

    #[test]
    fn test_tables_plain_output() {
        let out = run(Action::Tables, SQL, DatabaseEngine::Sqlite, false).unwrap();
        assert_eq!(out, "SELECT\tusers\nJOIN\torders");
    }

    #[test]
    fn test_params_plain_output() {
        let out = run(Action::Params, SQL, DatabaseEngine::Sqlite, false).unwrap();
        assert_eq!(out, "id");
    }

    #[test]
    fn test_format_for_dialect() {
        let sql = "SELECT name FROM users WHERE id = :id";
        let out = run(Action::Format, sql, DatabaseEngine::SqlServer, false).unwrap();
        assert_eq!(out, "SELECT [name] FROM [users] WHERE [id] = @id");
    }

    #[test]
    fn test_analyze_json_includes_rendering() {
        let sql = "SELECT name FROM users WHERE id = :id";
        let out = run(Action::Analyze, sql, DatabaseEngine::MySql, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["dialect"], "mysql");
        assert_eq!(value["tables"][0]["name"], "users");
        assert_eq!(value["parameters"][0], "id");
        assert_eq!(value["formatted"], "SELECT `name` FROM `users` WHERE `id` = ?id");
    }

    #[test]
    fn test_params_json_is_an_array() {
        let out = run(Action::Params, SQL, DatabaseEngine::Sqlite, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!(["id"]));
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{SQL}").unwrap();
        let sql = read_input(Some(file.path())).unwrap();
        assert_eq!(sql, SQL);
    }

    #[test]
    fn error_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.sql");
        let err = read_input(Some(&missing)).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn error_blank_input() {
        let err = run(Action::Analyze, "  \n", DatabaseEngine::Sqlite, false).unwrap_err();
        assert!(matches!(err, CliError::EmptyInput));
    }

    #[test]
    fn error_unbalanced_sql() {
        let err = run(Action::Analyze, "SELECT (a FROM t", DatabaseEngine::Sqlite, false).unwrap_err();
        assert!(matches!(err, CliError::Sql(_)));
    }
}
