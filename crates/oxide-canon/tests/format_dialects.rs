//! Rendering canonical SQL for each engine.

mod common;
use common::*;

use oxide_canon::{format, DatabaseEngine, Dialect, SqlError};

const QUERY: &str = "SELECT name FROM users WHERE id = @id";

#[test]
fn test_quoting_per_engine() {
    let expected = [
        (DatabaseEngine::SqlServer, "SELECT [name] FROM [users] WHERE [id] = @id"),
        (DatabaseEngine::MySql, "SELECT `name` FROM `users` WHERE `id` = ?id"),
        (DatabaseEngine::Oracle, "SELECT \"name\" FROM \"users\" WHERE \"id\" = :id"),
        (DatabaseEngine::Postgres, "SELECT \"name\" FROM \"users\" WHERE \"id\" = @id"),
        (DatabaseEngine::Sqlite, "SELECT \"name\" FROM \"users\" WHERE \"id\" = @id"),
    ];
    for (engine, sql) in expected {
        assert_eq!(render(QUERY, engine), sql, "engine: {engine}");
    }
}

#[test]
fn test_boolean_constants() {
    assert_eq!(
        render("SELECT name FROM users WHERE active = TRUE", DatabaseEngine::SqlServer),
        "SELECT [name] FROM [users] WHERE [active] = 1"
    );
    assert_eq!(
        render("SELECT name FROM users WHERE active = TRUE", DatabaseEngine::Postgres),
        "SELECT \"name\" FROM \"users\" WHERE \"active\" = TRUE"
    );
}

#[test]
fn test_date_functions() {
    assert_eq!(
        render("SELECT NOW() AS stamp FROM users", DatabaseEngine::SqlServer),
        "SELECT GETDATE() AS [stamp] FROM [users]"
    );
    assert_eq!(
        render("SELECT GETDATE() AS stamp FROM users", DatabaseEngine::MySql),
        "SELECT NOW() AS `stamp` FROM `users`"
    );
}

#[test]
fn test_concat_on_oracle() {
    assert_eq!(
        format("SELECT CONCAT([a], ' ', [b]) FROM {SELECT#t}", DatabaseEngine::Oracle.dialect())
            .unwrap(),
        "SELECT (\"a\" || ' ' || \"b\") FROM \"t\""
    );
}

#[test]
fn test_quoted_identifiers_survive_formatting() {
    let canonical = "SELECT [t].[false], [now] FROM {SELECT#t} [t] WHERE [t].[true] = TRUE";
    assert_eq!(
        format(canonical, DatabaseEngine::SqlServer.dialect()).unwrap(),
        "SELECT [t].[false], [now] FROM [t] [t] WHERE [t].[true] = 1"
    );
    assert_eq!(
        format(canonical, DatabaseEngine::Oracle.dialect()).unwrap(),
        "SELECT \"t\".\"false\", \"now\" FROM \"t\" \"t\" WHERE \"t\".\"true\" = 1"
    );
}

#[test]
fn test_literals_survive_formatting() {
    assert_eq!(
        render("SELECT 'NOW() [x] {y}' AS note FROM users", DatabaseEngine::SqlServer),
        "SELECT 'NOW() [x] {y}' AS [note] FROM [users]"
    );
}

#[test]
fn test_canonical_text_is_engine_neutral() {
    let canonical = canon(QUERY);
    for engine in DatabaseEngine::ALL {
        let dialect: &dyn Dialect = engine.dialect();
        let sql = format(&canonical, dialect).unwrap();
        assert!(!sql.contains('{'), "{engine}: {sql}");
    }
}

#[test]
fn test_paging_after_format() {
    let dialect = DatabaseEngine::SqlServer.dialect();
    let sql = format("SELECT [a] FROM {SELECT#t}", dialect).unwrap();
    assert_eq!(
        dialect.paged(&sql, Some(10), 0, Some("[a]")),
        "SELECT TOP(10) [a] FROM [t] ORDER BY [a]"
    );
}

#[test]
fn error_unknown_engine() {
    let err = "db2".parse::<DatabaseEngine>().unwrap_err();
    assert!(matches!(err, SqlError::Unsupported(_)));
}
