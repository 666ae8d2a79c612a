//! # oxide-query
//!
//! Compiles typed query-expression trees into canonical SQL and renders it
//! for a concrete database engine.
//!
//! This crate provides:
//! - `Entity` and `TableInfo` for describing the table behind a type
//! - `Query` for building chainable query trees
//! - `Expr` and `Lambda` for predicates, projections and keys
//! - `compile` for turning a tree into a `CommandSql`
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_query::dialect::PostgresDialect;
//! use oxide_query::query::{member, Lambda, Query};
//! use oxide_query::{compile, Entity, TableInfo, TableRegistry};
//!
//! struct Product;
//!
//! impl Entity for Product {
//!     fn table_info() -> TableInfo {
//!         TableInfo::builder("products")
//!             .key("id", "id")
//!             .field("name")
//!             .field("price")
//!             .build()
//!     }
//! }
//!
//! let query = Query::table::<Product>()
//!     .filter(Lambda::new("p", member("p", "price").gt(10)))
//!     .order_by(Lambda::new("p", member("p", "name")))
//!     .take(20);
//!
//! let command = compile(&query, &PostgresDialect, TableRegistry::global()).unwrap();
//! assert!(command.sql.starts_with("SELECT \"p\".\"id\""));
//! assert_eq!(command.parameters.len(), 1);
//! ```
//!
//! ## Mutations
//!
//! ```rust
//! use oxide_query::dialect::SqliteDialect;
//! use oxide_query::query::{member, object, value, Lambda, Query};
//! use oxide_query::{compile, Entity, TableInfo, TableRegistry};
//!
//! struct Tag;
//!
//! impl Entity for Tag {
//!     fn table_info() -> TableInfo {
//!         TableInfo::builder("tags").key("id", "id").field("label").build()
//!     }
//! }
//!
//! let rename = Query::table::<Tag>()
//!     .filter(Lambda::new("t", member("t", "id").eq(3)))
//!     .update(Lambda::new("t", object([("label", value("rust"))])));
//! let command = compile(&rename, &SqliteDialect, TableRegistry::global()).unwrap();
//! assert!(command.sql.starts_with("UPDATE \"tags\" SET \"label\" = "));
//! ```

pub mod compiler;
pub mod query;
pub mod schema;

pub use compiler::{compile, compile_canonical, CommandSql, RowStyle};
pub use query::{Expr, Lambda, Query};
pub use schema::{Entity, EntityType, TableInfo, TableRegistry, TableResolver};

// Re-export the canonical SQL layer
pub use oxide_canon::dialect;
pub use oxide_canon::{DatabaseEngine, Dialect, Parameters, Result, SqlError, SqlValue, ToSqlValue};
