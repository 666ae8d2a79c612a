#![allow(dead_code)]

use oxide_canon::dialect::SqliteDialect;
use oxide_query::{
    compile, compile_canonical, CommandSql, DatabaseEngine, Entity, Query, SqlError, SqlValue,
    TableInfo, TableRegistry,
};

pub struct User;

impl Entity for User {
    fn table_info() -> TableInfo {
        TableInfo::builder("users")
            .key("id", "id")
            .field("name")
            .field("age")
            .read_only("created", "created_at")
            .build()
    }
}

pub struct Order;

impl Entity for Order {
    fn table_info() -> TableInfo {
        TableInfo::builder("sales.orders")
            .key("id", "id")
            .field("user_id")
            .column("total", "amount")
            .token("version", "row_version", || SqlValue::Int(1))
            .build()
    }
}

/// Every column of `users` read through the alias `u`.
pub const USER_COLUMNS: &str =
    "[u].[id], [u].[name], [u].[age], [u].[created_at] AS [created]";

/// Compiles `query` to canonical SQL with SQLite paging.
pub fn canonical(query: &Query) -> CommandSql {
    compile_canonical(query, &SqliteDialect, TableRegistry::global())
        .unwrap_or_else(|e| panic!("Failed to compile: {query:?}\nError: {e:?}"))
}

/// Compiles `query` to canonical SQL with the paging of `engine`.
pub fn canonical_for(query: &Query, engine: DatabaseEngine) -> CommandSql {
    compile_canonical(query, engine.dialect(), TableRegistry::global())
        .unwrap_or_else(|e| panic!("Failed to compile for {engine}: {query:?}\nError: {e:?}"))
}

/// Compiles `query` and renders it for `engine`.
pub fn sql(query: &Query, engine: DatabaseEngine) -> String {
    compile(query, engine.dialect(), TableRegistry::global())
        .unwrap_or_else(|e| panic!("Failed to compile for {engine}: {query:?}\nError: {e:?}"))
        .sql
}

pub fn compile_err(query: &Query) -> SqlError {
    compile_err_for(query, DatabaseEngine::Sqlite)
}

pub fn compile_err_for(query: &Query, engine: DatabaseEngine) -> SqlError {
    compile_canonical(query, engine.dialect(), TableRegistry::global())
        .expect_err(&format!("Expected compile error for {engine}: {query:?}"))
}
