//! Query-tree compiler.
//!
//! The compiler walks a [`Query`] tree and writes canonical SQL through a
//! single [`Writer`]. Sub-statements (subqueries, derived tables, the arms
//! of a set operation) are rendered into isolated buffers with
//! [`Writer::nested`] so they share the parameter map, and spliced into the
//! enclosing statement afterwards.
//!
//! ```rust
//! use oxide_canon::dialect::SqlServerDialect;
//! use oxide_query::compiler::{compile, RowStyle};
//! use oxide_query::query::{member, Lambda, Query};
//! use oxide_query::schema::{Entity, TableInfo, TableRegistry};
//!
//! struct User;
//!
//! impl Entity for User {
//!     fn table_info() -> TableInfo {
//!         TableInfo::builder("users").key("id", "id").field("name").build()
//!     }
//! }
//!
//! let query = Query::table::<User>()
//!     .filter(Lambda::new("u", member("u", "id").eq(7)))
//!     .first();
//! let command = compile(&query, &SqlServerDialect, TableRegistry::global()).unwrap();
//! assert_eq!(
//!     command.sql,
//!     "SELECT TOP(1) [u].[id], [u].[name] FROM [users] [u] WHERE [u].[id] = @__variable_1"
//! );
//! assert_eq!(command.row_style, RowStyle::First);
//! ```

mod alias;
mod condition;
mod join;
mod mutation;
mod select;
mod set_ops;
mod value;

use oxide_canon::analyzer::format;
use oxide_canon::{Dialect, Parameters, Result, Writer};
use tracing::debug;

use crate::query::{Lambda, Query};
use crate::schema::TableResolver;

use alias::{AliasCache, Row, Scope};

/// How a downstream executor should read the rows of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStyle {
    /// Every row.
    #[default]
    None,
    /// The first row; no row is an error.
    First,
    /// The first row, if any.
    FirstOrDefault,
    /// The only row; no row or several rows is an error.
    Single,
    /// The only row, if any; several rows is an error.
    SingleOrDefault,
}

/// A compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSql {
    /// The statement text.
    pub sql: String,
    /// Bound parameters, in binding order.
    pub parameters: Parameters,
    /// How to read the result rows.
    pub row_style: RowStyle,
    /// Whether the executor must reverse the rows it reads. Set by
    /// `TakeLast` and `SkipLast`, which page from the end of the ordering.
    pub reverse_rows: bool,
}

/// Compiles `query` for `dialect`.
///
/// # Errors
///
/// Returns the first syntax, unsupported-construct, schema, type-access or
/// index-range error met while walking the tree. No partial output is
/// produced.
pub fn compile(
    query: &Query,
    dialect: &dyn Dialect,
    resolver: &dyn TableResolver,
) -> Result<CommandSql> {
    let mut command = compile_canonical(query, dialect, resolver)?;
    command.sql = format(&command.sql, dialect)?;
    Ok(command)
}

/// Compiles `query` to canonical SQL. Paging is already applied with the
/// dialect's template; token quoting and dialect rewrites are not.
///
/// # Errors
///
/// See [`compile`].
pub fn compile_canonical(
    query: &Query,
    dialect: &dyn Dialect,
    resolver: &dyn TableResolver,
) -> Result<CommandSql> {
    let mut compiler = Compiler::new(dialect, resolver);
    let mut w = Writer::new();
    let (row_style, reverse_rows) = compiler.statement(&mut w, query)?;
    let (sql, parameters) = w.into_parts();
    debug!(
        engine = %dialect.engine(),
        operator = query.operator(),
        parameters = parameters.len(),
        %sql,
        "compiled query"
    );
    Ok(CommandSql {
        sql,
        parameters,
        row_style,
        reverse_rows,
    })
}

/// State of one compilation.
pub(crate) struct Compiler<'a> {
    dialect: &'a dyn Dialect,
    resolver: &'a dyn TableResolver,
    aliases: AliasCache,
    bare_target: bool,
}

impl<'a> Compiler<'a> {
    fn new(dialect: &'a dyn Dialect, resolver: &'a dyn TableResolver) -> Self {
        Self {
            dialect,
            resolver,
            aliases: AliasCache::new(),
            bare_target: false,
        }
    }

    fn statement(&mut self, w: &mut Writer, query: &Query) -> Result<(RowStyle, bool)> {
        let scope = Scope::default();
        match query {
            Query::Insert { entity, values } => {
                self.insert(w, entity, values)?;
                Ok((RowStyle::None, false))
            }
            Query::Update {
                source,
                assignments,
            } => {
                self.update(w, source, assignments)?;
                Ok((RowStyle::None, false))
            }
            Query::Delete { source } => {
                self.delete(w, source)?;
                Ok((RowStyle::None, false))
            }
            Query::Any { .. } | Query::All { .. } | Query::Contains { .. } => {
                w.write("SELECT ");
                self.predicate_value_with(w, |this, w| this.exists(w, &scope, query))?;
                if let Some(dual) = self.dialect.dual_table() {
                    w.write(" FROM ");
                    w.write(dual);
                }
                Ok((RowStyle::Single, false))
            }
            _ => {
                let state = self.select_state(w, query, &scope)?;
                let rendered = self.render_select(&state, select::Render::Top)?;
                w.write(&rendered.sql);
                Ok((state.row_style, state.reverse_rows))
            }
        }
    }

    /// Extends `scope` with the single parameter of `lambda` bound to `row`.
    fn bind(&mut self, scope: &Scope, lambda: &Lambda, row: &Row) -> Result<Scope> {
        let param = lambda.single_param()?;
        Ok(self.bind_param(scope, param, row))
    }

    fn bind_param(&mut self, scope: &Scope, param: &str, row: &Row) -> Scope {
        if let Row::Source(slot) = row {
            self.aliases.bind(*slot, param);
        }
        scope.with(param, row.clone())
    }
}
