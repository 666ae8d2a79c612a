//! # oxide-canon
//!
//! Canonical SQL: one engine-neutral text form shared by hand-written SQL
//! and generated SQL, rendered for a concrete database at the last moment.
//!
//! This crate provides:
//! - A multi-pass normalizer turning hand-written SQL into canonical SQL
//! - A writer and parameter binder for generating canonical SQL
//! - Dialects for SQL Server, MySQL, Oracle, PostgreSQL and SQLite
//! - A regex rule engine for dialect-specific text rewrites
//!
//! ## Canonical tokens
//!
//! Canonical SQL marks every table, field and parameter reference:
//! `{COMMAND#name}` for tables, `[name]` for fields and aliases, `{name}`
//! for bound parameters.
//!
//! ```rust
//! use oxide_canon::analyzer::{analyze, format};
//! use oxide_canon::dialect::{MySqlDialect, SqlServerDialect};
//!
//! let canonical = analyze("SELECT name FROM users WHERE id = :id").unwrap();
//! assert_eq!(canonical, "SELECT [name] FROM {SELECT#users} WHERE [id] = {id}");
//!
//! // The same canonical text serves every engine.
//! assert_eq!(
//!     format(&canonical, &SqlServerDialect).unwrap(),
//!     "SELECT [name] FROM [users] WHERE [id] = @id"
//! );
//! assert_eq!(
//!     format(&canonical, &MySqlDialect).unwrap(),
//!     "SELECT `name` FROM `users` WHERE `id` = ?id"
//! );
//! ```
//!
//! ## Writing canonical SQL
//!
//! ```rust
//! use oxide_canon::token::Command;
//! use oxide_canon::writer::Writer;
//! use oxide_canon::SqlValue;
//!
//! let mut w = Writer::new();
//! w.write("SELECT * FROM ");
//! w.table_name(Command::Select, "users");
//! w.where_clause();
//! w.name(None, "age");
//! w.compare(oxide_canon::writer::Comparison::Gt);
//! w.parameter(SqlValue::Int(18));
//!
//! let (sql, params) = w.into_parts();
//! assert_eq!(sql, "SELECT * FROM {SELECT#users} WHERE [age] > {__variable_1}");
//! assert_eq!(params.get("__variable_1"), Some(&SqlValue::Int(18)));
//! ```

pub mod analyzer;
pub mod dialect;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod token;
pub mod value;
pub mod writer;

pub use analyzer::{analyze, analyze_parameters, analyze_tables, format};
pub use dialect::{DatabaseEngine, Dialect, MutationStyle};
pub use error::{Result, SqlError};
pub use formatter::{Fallback, Param, RuleSet, SqlFormatter};
pub use token::{Command, TableToken};
pub use value::{SqlValue, ToSqlValue};
pub use writer::{Comparison, Parameters, Writer};
