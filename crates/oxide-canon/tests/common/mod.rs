#![allow(dead_code)]

use oxide_canon::{analyze, format, DatabaseEngine, SqlError};

pub fn canon(sql: &str) -> String {
    analyze(sql).unwrap_or_else(|e| panic!("Failed to analyze: {sql}\nError: {e:?}"))
}

pub fn canon_err(sql: &str) -> SqlError {
    analyze(sql).expect_err(&format!("Expected analyze error for: {sql}"))
}

/// Analyzes `sql` and renders it for `engine`.
pub fn render(sql: &str, engine: DatabaseEngine) -> String {
    let canonical = canon(sql);
    format(&canonical, engine.dialect())
        .unwrap_or_else(|e| panic!("Failed to format for {engine}: {canonical}\nError: {e:?}"))
}

/// Verifies that analyzing canonical SQL again changes nothing.
pub fn fixed_point(sql: &str) {
    let first = canon(sql);
    let second = canon(&first);
    assert_eq!(
        first, second,
        "Analyze is not idempotent.\n  Input:    {sql}\n  First:    {first}\n  Second:   {second}"
    );
}
