//! INSERT, UPDATE and DELETE statements.
//!
//! UPDATE and DELETE accept a table narrowed by filters and joins. Without
//! joins the target is written unaliased; with joins the statement shape
//! follows the dialect's [`MutationStyle`].

use std::sync::Arc;

use oxide_canon::token::{field_token, Command};
use oxide_canon::{MutationStyle, Result, SqlError, Writer};

use super::alias::Scope;
use super::select::{JoinClause, SelectState, Source};
use super::Compiler;
use crate::query::{Expr, JoinKind, Lambda, Query};
use crate::schema::{EntityType, TableInfo};

fn initializer<'e>(expr: &'e Expr, statement: &str) -> Result<&'e [(String, Expr)]> {
    match expr {
        Expr::New(members) if !members.is_empty() => Ok(members),
        _ => Err(SqlError::schema(format!(
            "{statement} needs an object initializer naming at least one field"
        ))),
    }
}

fn writable<'i>(info: &'i TableInfo, field: &str) -> Result<&'i str> {
    info.writable_column(field).ok_or_else(|| {
        SqlError::schema(format!(
            "`{field}` is not a writable field of `{}`",
            info.name()
        ))
    })
}

/// Checks that `query` is a table narrowed only by filters and joins, and
/// reports whether it joins.
fn mutation_target(query: &Query, statement: &str) -> Result<bool> {
    let mut joined = false;
    let mut node = query;
    loop {
        match node {
            Query::Table(_) => return Ok(joined),
            Query::Where { source, .. } => node = source,
            Query::Join { source, .. } => {
                joined = true;
                node = source;
            }
            other => {
                return Err(SqlError::unsupported(format!(
                    "{statement} cannot target a `{}` query",
                    other.operator()
                )))
            }
        }
    }
}

/// Binds a fresh value for every auto-value field the initializer does not
/// assign. Returns `(column, parameter)` pairs.
fn missing_tokens(
    w: &mut Writer,
    info: &TableInfo,
    members: &[(String, Expr)],
) -> Result<Vec<(String, String)>> {
    let mut injected = Vec::new();
    for (field, factory) in info.tokens() {
        if members.iter().any(|(assigned, _)| assigned == field) {
            continue;
        }
        let column = writable(info, field)?.to_string();
        let (param, ()) = w.nested(|child| {
            child.parameter(factory());
            Ok(())
        })?;
        injected.push((column, param));
    }
    Ok(injected)
}

fn where_sql(state: &SelectState) -> String {
    if state.wheres.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", state.wheres.join(" AND "))
    }
}

impl Compiler<'_> {
    pub(crate) fn insert(&mut self, w: &mut Writer, entity: &EntityType, values: &Expr) -> Result<()> {
        let info = self.resolver.resolve(entity)?;
        let members = initializer(values, "INSERT")?;
        let scope = Scope::default();

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for (field, expr) in members {
            columns.push(field_token(writable(&info, field)?));
            params.push(self.value_sql(w, &scope, expr)?);
        }
        for (column, value) in missing_tokens(w, &info, members)? {
            columns.push(field_token(&column));
            params.push(value);
        }

        w.write("INSERT INTO ");
        w.table_name(Command::Insert, info.name());
        w.write(" (");
        w.write(&columns.join(", "));
        w.write(") VALUES (");
        w.write(&params.join(", "));
        w.close_brace();
        Ok(())
    }

    /// Compiles the target rows of an UPDATE or DELETE.
    fn mutation_state(
        &mut self,
        w: &mut Writer,
        source: &Query,
        statement: &str,
    ) -> Result<(SelectState, Arc<TableInfo>, bool)> {
        let joined = mutation_target(source, statement)?;
        self.bare_target = !joined;
        let state = self.select_state(w, source, &Scope::default());
        self.bare_target = false;
        let state = state?;
        let Source::Table(slot) = state.from else {
            return Err(SqlError::unsupported(format!(
                "{statement} needs a table target"
            )));
        };
        let info = self
            .aliases
            .table(slot)
            .map(Arc::clone)
            .ok_or_else(|| SqlError::unsupported(format!("{statement} needs a table target")))?;
        if joined && self.dialect.mutation_style() == MutationStyle::Inline {
            return Err(SqlError::unsupported(format!(
                "{} does not support joined {statement}",
                self.dialect.engine()
            )));
        }
        Ok((state, info, joined))
    }

    pub(crate) fn update(&mut self, w: &mut Writer, source: &Query, assignments: &Lambda) -> Result<()> {
        let (state, info, joined) = self.mutation_state(w, source, "UPDATE")?;
        let members = initializer(assignments.body(), "UPDATE")?;
        let Source::Table(slot) = state.from else {
            return Err(SqlError::unsupported("UPDATE needs a table target"));
        };
        let style = self.dialect.mutation_style();
        let alias = field_token(&self.aliases.alias(slot));
        let qualify = joined && matches!(style, MutationStyle::FromClause | MutationStyle::InlineJoin);
        let set_column = |column: &str| {
            if qualify {
                format!("{alias}.{}", field_token(column))
            } else {
                field_token(column)
            }
        };

        let scope = self.bind(&Scope::default(), assignments, &state.row)?;
        let mut sets = Vec::new();
        for (field, expr) in members {
            let column = writable(&info, field)?;
            let value = self.value_sql(w, &scope, expr)?;
            sets.push(format!("{} = {value}", set_column(column)));
        }
        for (column, value) in missing_tokens(w, &info, members)? {
            sets.push(format!("{} = {value}", set_column(&column)));
        }
        let sets = sets.join(", ");

        let target = self.source_sql(&state.from, Command::Update)?;
        let filter = where_sql(&state);
        let sql = if joined {
            match style {
                MutationStyle::FromClause => {
                    let joins = self.joins_sql(&state.joins)?;
                    format!("UPDATE {alias} SET {sets} FROM {target}{joins}{filter}")
                }
                MutationStyle::InlineJoin => {
                    let joins = self.joins_sql(&state.joins)?;
                    format!("UPDATE {target}{joins} SET {sets}{filter}")
                }
                MutationStyle::UsingClause | MutationStyle::Inline => {
                    let (sources, conditions) = self.using_sources(&state)?;
                    format!("UPDATE {target} SET {sets} FROM {sources} WHERE {conditions}")
                }
            }
        } else {
            format!("UPDATE {target} SET {sets}{filter}")
        };
        w.write(&sql);
        Ok(())
    }

    pub(crate) fn delete(&mut self, w: &mut Writer, source: &Query) -> Result<()> {
        let (state, _, joined) = self.mutation_state(w, source, "DELETE")?;
        let target = self.source_sql(&state.from, Command::Delete)?;
        let filter = where_sql(&state);
        let sql = if joined {
            match self.dialect.mutation_style() {
                MutationStyle::FromClause | MutationStyle::InlineJoin => {
                    let Source::Table(slot) = state.from else {
                        return Err(SqlError::unsupported("DELETE needs a table target"));
                    };
                    let alias = field_token(&self.aliases.alias(slot));
                    let joins = self.joins_sql(&state.joins)?;
                    format!("DELETE {alias} FROM {target}{joins}{filter}")
                }
                MutationStyle::UsingClause | MutationStyle::Inline => {
                    let (sources, conditions) = self.using_sources(&state)?;
                    format!("DELETE FROM {target} USING {sources} WHERE {conditions}")
                }
            }
        } else {
            format!("DELETE FROM {target}{filter}")
        };
        w.write(&sql);
        Ok(())
    }

    fn joins_sql(&mut self, joins: &[JoinClause]) -> Result<String> {
        let mut sql = String::new();
        for join in joins {
            sql.push_str(&self.join_sql(join)?);
        }
        Ok(sql)
    }

    /// Splits inner joins into a source list and the conditions that
    /// replace their ON clauses.
    fn using_sources(&mut self, state: &SelectState) -> Result<(String, String)> {
        let mut sources = Vec::with_capacity(state.joins.len());
        let mut conditions = Vec::with_capacity(state.joins.len() + state.wheres.len());
        for join in &state.joins {
            if join.kind != JoinKind::Inner {
                return Err(SqlError::unsupported(format!(
                    "{} supports only inner joins in UPDATE and DELETE",
                    self.dialect.engine()
                )));
            }
            sources.push(self.source_sql(&join.target, Command::Join)?);
            conditions.push(join.on.clone());
        }
        conditions.extend(state.wheres.iter().cloned());
        Ok((sources.join(", "), conditions.join(" AND ")))
    }
}
