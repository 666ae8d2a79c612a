//! SQL normalizer.
//!
//! [`analyze`] turns hand-written SQL into canonical SQL by running an
//! ordered sequence of passes. Each pass reads the previous pass's output,
//! so the order matters:
//!
//! 1. strip comments and
//! 2. move quoted literals into `'--#N'` placeholders,
//! 3. collapse blank lines,
//! 4. rewrite `TRIM(x)` as `LTRIM(RTRIM(x))`,
//! 5. tag DDL and `INSERT INTO` targets,
//! 6. tag `UPDATE`/`DELETE` targets,
//! 7. tag `FROM`/`JOIN` sources and their aliases,
//! 8. tag `:name`/`@name`/`?name` parameters,
//! 9. move `DECLARE ...;` blocks into placeholders,
//! 10. tag `alias.field` chains,
//! 11. tag lone `(name)` identifiers,
//! 12. tag bare fields by their neighbors,
//! 13. tag `AS alias` and derived table aliases,
//! 14. restore the placeholders.
//!
//! ```rust
//! use oxide_canon::analyzer::{analyze, analyze_parameters, analyze_tables};
//!
//! let canonical = analyze("SELECT id, name FROM users u WHERE u.id = @id").unwrap();
//! assert_eq!(
//!     canonical,
//!     "SELECT [id], [name] FROM {SELECT#users} [u] WHERE [u].[id] = {id}"
//! );
//! assert_eq!(analyze_tables(&canonical)[0].to_string(), "{SELECT#users}");
//! assert_eq!(analyze_parameters(&canonical), vec!["id"]);
//! ```

mod cleanup;
mod fields;
mod format;
mod keywords;
mod placeholders;
mod scanner;
mod tables;

pub use format::format;

use tracing::{debug, trace};

use crate::error::{Result, SqlError};
use crate::lexer::{TokenKind, TokenStream};
use crate::token::{parse_parameter, TableToken};

use placeholders::Placeholders;
use scanner::Scanner;

/// Normalizes `sql` into canonical SQL.
///
/// # Errors
///
/// Returns a syntax error for empty input, unterminated literals or
/// comments, unbalanced parentheses, a `CASE` without `END`, or if the
/// placeholders cannot be restored.
pub fn analyze(sql: &str) -> Result<String> {
    if sql.trim().is_empty() {
        return Err(SqlError::syntax("empty SQL statement"));
    }
    let mut placeholders = Placeholders::default();
    let text = Scanner::new(sql).scan(&mut placeholders)?;
    if text.trim().is_empty() {
        return Err(SqlError::syntax("SQL statement contains only comments"));
    }
    validate(&text)?;

    let passes: [(&str, fn(&str) -> String); 5] = [
        ("collapse blank lines", cleanup::collapse_blank_lines),
        ("rewrite trim", cleanup::rewrite_trim),
        ("definitions", tables::tag_definitions),
        ("mutations", tables::tag_mutations),
        ("sources", tables::tag_sources),
    ];
    let mut text = text;
    for (name, pass) in passes {
        text = pass(&text);
        trace!(pass = name, sql = %text);
    }
    text = fields::tag_parameters(&text);
    text = placeholders.extract_declarations(&text);
    let passes: [(&str, fn(&str) -> String); 4] = [
        ("qualified", fields::tag_qualified),
        ("parenthesized", fields::tag_parenthesized),
        ("positional", fields::tag_positional),
        ("aliases", fields::tag_aliases),
    ];
    for (name, pass) in passes {
        text = pass(&text);
        trace!(pass = name, sql = %text);
    }
    let text = placeholders.restore(&text)?;
    debug!(input_len = sql.len(), output_len = text.len(), "analyzed sql");
    Ok(text)
}

/// Rejects unbalanced parentheses and unterminated `CASE` blocks.
fn validate(text: &str) -> Result<()> {
    let ts = TokenStream::new(text);
    let mut depth = 0usize;
    let mut cases = 0usize;
    let mut ends = 0usize;
    for i in 0..ts.len() {
        if ts.is_punct(i, "(") {
            depth += 1;
        } else if ts.is_punct(i, ")") {
            depth = depth.checked_sub(1).ok_or_else(|| {
                SqlError::syntax(format!("unbalanced `)` at byte {}", ts.span(i).start))
            })?;
        } else if ts.is_word(i, "CASE") {
            cases += 1;
        } else if ts.is_word(i, "END") {
            ends += 1;
        }
    }
    if depth > 0 {
        return Err(SqlError::syntax(format!("{depth} unclosed `(`")));
    }
    if cases > ends {
        return Err(SqlError::syntax(format!(
            "{} CASE without matching END",
            cases - ends
        )));
    }
    Ok(())
}

/// Lists the table tokens of canonical SQL, deduplicated by first
/// occurrence. Literals are skipped.
#[must_use]
pub fn analyze_tables(canonical: &str) -> Vec<TableToken> {
    let ts = TokenStream::new(canonical);
    let mut tables: Vec<TableToken> = Vec::new();
    for i in 0..ts.len() {
        if ts.kind(i) != TokenKind::Brace {
            continue;
        }
        let Some(table) = TableToken::parse(ts.text(i)) else {
            continue;
        };
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

/// Lists the parameter names of canonical SQL, deduplicated by first
/// occurrence. Literals are skipped.
#[must_use]
pub fn analyze_parameters(canonical: &str) -> Vec<String> {
    let ts = TokenStream::new(canonical);
    let mut names: Vec<String> = Vec::new();
    for i in 0..ts.len() {
        if ts.kind(i) != TokenKind::Brace {
            continue;
        }
        if let Some(name) = parse_parameter(ts.text(i)) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Command;

    #[test]
    fn error_empty_input() {
        assert!(matches!(analyze("   \n "), Err(SqlError::Syntax(_))));
        assert!(matches!(analyze("-- nothing"), Err(SqlError::Syntax(_))));
    }

    #[test]
    fn error_unbalanced_parentheses() {
        assert!(matches!(analyze("SELECT (a FROM t"), Err(SqlError::Syntax(_))));
        assert!(matches!(analyze("SELECT a) FROM t"), Err(SqlError::Syntax(_))));
    }

    #[test]
    fn error_case_without_end() {
        assert!(matches!(
            analyze("SELECT CASE WHEN a = 1 THEN 2 FROM t"),
            Err(SqlError::Syntax(_))
        ));
    }

    #[test]
    fn test_parentheses_inside_literals_do_not_count() {
        assert_eq!(
            analyze("SELECT ':(' AS face FROM t").unwrap(),
            "SELECT ':(' AS [face] FROM {SELECT#t}"
        );
    }

    #[test]
    fn test_tables_are_deduplicated_in_order() {
        let tables = analyze_tables("{SELECT#a} {JOIN#b} {select#a} '{SELECT#c}' {JOIN#a}");
        assert_eq!(
            tables,
            vec![
                TableToken::new(Command::Select, "a"),
                TableToken::new(Command::Join, "b"),
                TableToken::new(Command::Join, "a"),
            ]
        );
    }

    #[test]
    fn test_parameters_skip_literals_and_tables() {
        assert_eq!(
            analyze_parameters("{a} = {b} OR {a} = '{c}' OR {SELECT#t}"),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_declare_block_is_opaque() {
        assert_eq!(
            analyze("DECLARE @n INT = 1; SELECT name FROM t WHERE id = @n").unwrap(),
            "DECLARE {n} INT = 1; SELECT [name] FROM {SELECT#t} WHERE [id] = {n}"
        );
    }

    #[test]
    fn test_comments_inside_literals_survive() {
        assert_eq!(
            analyze("SELECT '-- not a comment' FROM t -- comment").unwrap(),
            "SELECT '-- not a comment' FROM {SELECT#t}"
        );
    }
}
