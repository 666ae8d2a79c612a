//! SELECT statements: the operator pipeline and its rendering.
//!
//! Operators are applied bottom-up to a [`SelectState`], which collects the
//! clauses of one statement. An operator that cannot be expressed in the
//! current statement (a filter after paging, an aggregate over a distinct
//! projection) first turns the statement into a derived table and starts a
//! new one around it.

use std::sync::Arc;

use oxide_canon::token::{field_token, Command, TableToken};
use oxide_canon::{Result, SqlError, Writer};

use super::alias::{Row, Scope, SlotId, VALUE_COLUMN};
use super::condition::Outcome;
use super::value::Resolved;
use super::{Compiler, RowStyle};
use crate::query::{ElementKind, Expr, JoinKind, Lambda, Query, GROUP_KEY};

/// Condition written for filters that can never hold.
pub(crate) const FALSE_CONDITION: &str = "1 = 0";

/// Where a statement reads its rows from.
#[derive(Debug)]
pub(crate) enum Source {
    Table(SlotId),
    Derived { sql: String, slot: SlotId },
    /// A set operation that has not been composed any further.
    Compound(Rendered),
}

#[derive(Debug)]
pub(crate) struct JoinClause {
    pub(crate) kind: JoinKind,
    pub(crate) target: Source,
    pub(crate) on: String,
}

/// Clauses of one SELECT statement.
#[derive(Debug)]
pub(crate) struct SelectState {
    pub(crate) from: Source,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) havings: Vec<String>,
    pub(crate) orders: Vec<String>,
    pub(crate) row: Row,
    pub(crate) distinct: bool,
    pub(crate) grouped: bool,
    pub(crate) aggregate: Option<String>,
    pub(crate) take: Option<u64>,
    pub(crate) skip: u64,
    pub(crate) paged_from_end: bool,
    pub(crate) terminal: Option<&'static str>,
    pub(crate) row_style: RowStyle,
    pub(crate) reverse_rows: bool,
}

impl SelectState {
    pub(crate) fn new(from: Source, row: Row) -> Self {
        Self {
            from,
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            row,
            distinct: false,
            grouped: false,
            aggregate: None,
            take: None,
            skip: 0,
            paged_from_end: false,
            terminal: None,
            row_style: RowStyle::None,
            reverse_rows: false,
        }
    }

    pub(crate) const fn is_paged(&self) -> bool {
        self.take.is_some() || self.skip > 0
    }

    fn take(&mut self, count: u64) -> Result<()> {
        self.check_from_end()?;
        match self.take {
            Some(current) if count > current => Err(SqlError::index_out_of_range(format!(
                "Take({count}) exceeds the {current} rows already taken"
            ))),
            _ => {
                self.take = Some(count);
                Ok(())
            }
        }
    }

    fn skip(&mut self, count: u64) -> Result<()> {
        self.check_from_end()?;
        match self.take {
            Some(current) if count > 0 && count >= current => {
                Err(SqlError::index_out_of_range(format!(
                    "Skip({count}) passes the {current} rows already taken"
                )))
            }
            Some(current) => {
                self.take = Some(current - count);
                self.skip += count;
                Ok(())
            }
            None => {
                self.skip += count;
                Ok(())
            }
        }
    }

    fn check_from_end(&self) -> Result<()> {
        if self.paged_from_end {
            return Err(SqlError::unsupported(
                "paging after `TakeLast` or `SkipLast`",
            ));
        }
        Ok(())
    }

    fn require_order(&self, operator: &str) -> Result<()> {
        if self.orders.is_empty() {
            return Err(SqlError::syntax(format!(
                "`{operator}` requires a preceding `OrderBy`"
            )));
        }
        Ok(())
    }

    /// Pages from the end of the ordering by flipping it.
    fn from_end(&mut self, operator: &str) -> Result<()> {
        self.require_order(operator)?;
        if self.is_paged() {
            return Err(SqlError::unsupported(format!("`{operator}` after paging")));
        }
        self.flip_order();
        self.reverse_rows = !self.reverse_rows;
        self.paged_from_end = true;
        Ok(())
    }

    fn flip_order(&mut self) {
        for order in &mut self.orders {
            *order = match order.strip_suffix(" DESC") {
                Some(ascending) => ascending.to_string(),
                None => format!("{order} DESC"),
            };
        }
    }
}

/// How a statement is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Render {
    /// The outermost statement.
    Top,
    /// A derived table or a set-operation arm: single values get a name.
    Derived,
    /// A scalar or `IN` subquery.
    Subquery,
    /// The body of `EXISTS (...)`.
    Exists,
}

/// A rendered statement and the names of its columns.
#[derive(Debug, Clone)]
pub(crate) struct Rendered {
    pub(crate) sql: String,
    pub(crate) columns: Vec<String>,
    pub(crate) scalar: bool,
}

struct Column {
    sql: String,
    name: String,
    named: bool,
}

impl Column {
    fn to_sql(&self) -> String {
        let token = field_token(&self.name);
        if self.named && !self.sql.ends_with(&format!(".{token}")) {
            format!("{} AS {token}", self.sql)
        } else {
            self.sql.clone()
        }
    }
}

impl Compiler<'_> {
    /// Builds the statement for a query that yields rows.
    pub(crate) fn select_state(
        &mut self,
        w: &mut Writer,
        query: &Query,
        scope: &Scope,
    ) -> Result<SelectState> {
        match query {
            Query::Table(entity) => {
                let info = self.resolver.resolve(entity)?;
                let bare = std::mem::take(&mut self.bare_target);
                let slot = self.aliases.add_table(info, bare);
                Ok(SelectState::new(Source::Table(slot), Row::Source(slot)))
            }
            Query::SetOp { left, op, right } => self.set_op(w, left, *op, right, scope),
            Query::Insert { .. }
            | Query::Update { .. }
            | Query::Delete { .. }
            | Query::Any { .. }
            | Query::All { .. }
            | Query::Contains { .. } => Err(SqlError::unsupported(format!(
                "`{}` does not yield rows",
                query.operator()
            ))),
            _ => {
                let source = query.source().ok_or_else(|| {
                    SqlError::unsupported(format!("`{}` has no source", query.operator()))
                })?;
                let mut state = self.select_state(w, source, scope)?;
                if let Some(terminal) = state.terminal {
                    return Err(SqlError::unsupported(format!(
                        "`{}` cannot follow `{terminal}`",
                        query.operator()
                    )));
                }
                if matches!(state.from, Source::Compound(_)) {
                    state = self.wrap(state)?;
                }
                self.apply(w, state, query, scope)
            }
        }
    }

    fn apply(
        &mut self,
        w: &mut Writer,
        mut state: SelectState,
        query: &Query,
        scope: &Scope,
    ) -> Result<SelectState> {
        match query {
            Query::Where { predicate, .. } => return self.filter(w, state, predicate, scope, false),
            Query::Select { selector, .. } => {
                if state.distinct {
                    state = self.wrap(state)?;
                }
                let inner = self.bind(scope, selector, &state.row)?;
                state.row = self.shape(w, &inner, selector.body())?;
            }
            Query::Distinct { .. } => {
                if state.is_paged() {
                    state = self.wrap(state)?;
                }
                state.distinct = true;
            }
            Query::OrderBy {
                key,
                descending,
                then_by,
                ..
            } => {
                if state.is_paged() {
                    state = self.wrap(state)?;
                }
                if *then_by && state.orders.is_empty() {
                    return Err(SqlError::syntax("`ThenBy` requires a preceding `OrderBy`"));
                }
                if !*then_by {
                    // A fresh ordering defines the row order on its own.
                    state.orders.clear();
                    state.reverse_rows = false;
                }
                let inner = self.bind(scope, key, &state.row)?;
                for sql in self.keys(w, &inner, key.body())? {
                    state
                        .orders
                        .push(if *descending { format!("{sql} DESC") } else { sql });
                }
            }
            Query::Join { .. } => return self.join(w, state, query, scope),
            Query::GroupBy { key, .. } => {
                if state.is_paged() || state.distinct || state.grouped {
                    state = self.wrap(state)?;
                }
                let inner = self.bind(scope, key, &state.row)?;
                let key_row = self.shape(w, &inner, key.body())?;
                match &key_row {
                    Row::Scalar(sql) => state.groups.push(sql.clone()),
                    Row::Projected(members) => {
                        state.groups.extend(members.iter().map(|(_, sql)| sql.clone()));
                    }
                    _ => return Err(SqlError::unsupported("grouping by a whole row")),
                }
                let element = std::mem::replace(&mut state.row, Row::Scalar(String::new()));
                state.row = Row::Grouped {
                    key: Box::new(key_row),
                    element: Box::new(element),
                };
                state.grouped = true;
            }
            Query::Take { count, .. } => state.take(*count)?,
            Query::Skip { count, .. } => state.skip(*count)?,
            Query::TakeLast { count, .. } => {
                state.from_end("TakeLast")?;
                state.take = Some(*count);
            }
            Query::SkipLast { count, .. } => {
                state.from_end("SkipLast")?;
                state.skip = *count;
            }
            Query::Reverse { .. } => {
                state.require_order("Reverse")?;
                if state.is_paged() {
                    state.reverse_rows = !state.reverse_rows;
                } else {
                    state.flip_order();
                }
            }
            Query::ElementAt {
                index, or_default, ..
            } => {
                state.skip(*index)?;
                state.take(1)?;
                state.row_style = if *or_default {
                    RowStyle::FirstOrDefault
                } else {
                    RowStyle::First
                };
                state.terminal = Some(query.operator());
            }
            Query::Element {
                kind,
                or_default,
                predicate,
                ..
            } => {
                if let Some(predicate) = predicate {
                    state = self.filter(w, state, predicate, scope, false)?;
                }
                state.row_style = match kind {
                    ElementKind::First | ElementKind::Last if *or_default => RowStyle::FirstOrDefault,
                    ElementKind::First | ElementKind::Last => RowStyle::First,
                    ElementKind::Single if *or_default => RowStyle::SingleOrDefault,
                    ElementKind::Single => RowStyle::Single,
                };
                match kind {
                    ElementKind::First => state.take = Some(state.take.map_or(1, |t| t.min(1))),
                    ElementKind::Single => state.take = Some(state.take.map_or(2, |t| t.min(2))),
                    ElementKind::Last => {
                        state.require_order("Last")?;
                        if state.is_paged() {
                            return Err(SqlError::unsupported("`Last` after paging"));
                        }
                        state.flip_order();
                        state.take = Some(1);
                    }
                }
                state.terminal = Some(query.operator());
            }
            Query::Aggregate { func, selector, .. } => {
                if state.is_paged() || state.distinct || state.grouped {
                    state = self.wrap(state)?;
                }
                let argument = match selector {
                    Some(selector) => {
                        let inner = self.bind(scope, selector, &state.row)?;
                        Some(self.value_sql(w, &inner, selector.body())?)
                    }
                    None if func.is_count() => None,
                    None => match self.settle_row(&state.row) {
                        Resolved::Column(sql) => Some(sql),
                        Resolved::Row(_) => {
                            return Err(SqlError::syntax(format!("`{func}` needs a selector")))
                        }
                    },
                };
                state.aggregate = Some(func.to_sql(argument.as_deref()));
                state.orders.clear();
                state.row_style = RowStyle::Single;
                state.terminal = Some(query.operator());
            }
            other => {
                return Err(SqlError::unsupported(format!(
                    "`{}` is not a row operator",
                    other.operator()
                )))
            }
        }
        Ok(state)
    }

    /// Adds a WHERE condition, or a HAVING condition once the rows are
    /// grouped. `negate` wraps the condition in `NOT (...)`.
    pub(crate) fn filter(
        &mut self,
        w: &mut Writer,
        mut state: SelectState,
        predicate: &Lambda,
        scope: &Scope,
        negate: bool,
    ) -> Result<SelectState> {
        if predicate.body().is_boolean_literal() {
            return Err(SqlError::syntax(
                "a filter cannot be a boolean literal; compare a column instead",
            ));
        }
        if state.is_paged() || state.distinct {
            state = self.wrap(state)?;
        }
        let inner = self.bind(scope, predicate, &state.row)?;
        let (sql, outcome) = w.nested(|child| self.condition(child, &inner, predicate.body()))?;
        let clause = match (outcome, negate) {
            (Outcome::Written, false) => Some(sql),
            (Outcome::Written, true) => Some(format!("NOT ({sql})")),
            (Outcome::AlwaysFalse, false) | (Outcome::AlwaysTrue, true) => {
                Some(FALSE_CONDITION.to_string())
            }
            _ => None,
        };
        if let Some(clause) = clause {
            if state.grouped {
                state.havings.push(clause);
            } else {
                state.wheres.push(clause);
            }
        }
        Ok(state)
    }

    /// Compiles a lambda body into a row shape: an object initializer, a
    /// whole row or a single value.
    pub(crate) fn shape(&mut self, w: &mut Writer, scope: &Scope, body: &Expr) -> Result<Row> {
        let Expr::New(members) = body else {
            return self.shape_member(w, scope, body);
        };
        if members.is_empty() {
            return Err(SqlError::syntax("an object initializer needs at least one member"));
        }
        let mut rows = Vec::with_capacity(members.len());
        for (name, expr) in members {
            rows.push((name.clone(), self.shape_member(w, scope, expr)?));
        }
        let projected: Option<Vec<(String, String)>> = rows
            .iter()
            .map(|(name, row)| match row {
                Row::Scalar(sql) => Some((name.clone(), sql.clone())),
                _ => None,
            })
            .collect();
        Ok(projected.map_or(Row::Joined(rows), Row::Projected))
    }

    fn shape_member(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<Row> {
        match self.resolve(scope, expr)? {
            Some(Resolved::Row(row)) => Ok(row),
            Some(Resolved::Column(sql)) => Ok(Row::Scalar(sql)),
            None => Ok(Row::Scalar(self.value_sql(w, scope, expr)?)),
        }
    }

    /// Compiles ordering keys; an object initializer yields one key per
    /// member.
    fn keys(&mut self, w: &mut Writer, scope: &Scope, body: &Expr) -> Result<Vec<String>> {
        match body {
            Expr::New(members) => members
                .iter()
                .map(|(_, expr)| self.value_sql(w, scope, expr))
                .collect(),
            other => Ok(vec![self.value_sql(w, scope, other)?]),
        }
    }

    fn settle_row(&mut self, row: &Row) -> Resolved {
        match row {
            Row::Scalar(sql) => Resolved::Column(sql.clone()),
            Row::Source(slot) if self.aliases.is_scalar(*slot) => {
                Resolved::Column(self.qualified(*slot, VALUE_COLUMN))
            }
            other => Resolved::Row(other.clone()),
        }
    }

    /// Turns a statement into a derived table and starts a new statement
    /// reading from it.
    pub(crate) fn wrap(&mut self, state: SelectState) -> Result<SelectState> {
        let rendered = self.render_select(&state, Render::Derived)?;
        let slot = self.aliases.add_derived(rendered.columns, rendered.scalar);
        let mut next = SelectState::new(
            Source::Derived {
                sql: rendered.sql,
                slot,
            },
            Row::Source(slot),
        );
        next.reverse_rows = state.reverse_rows;
        Ok(next)
    }

    /// Renders a complete statement, paging included.
    pub(crate) fn render_select(&mut self, state: &SelectState, mode: Render) -> Result<Rendered> {
        if let Source::Compound(rendered) = &state.from {
            return Ok(rendered.clone());
        }
        let (columns, scalar) = self.projection(state, mode)?;

        let mut sql = String::from("SELECT ");
        if state.distinct {
            sql.push_str("DISTINCT ");
        }
        let list: Vec<String> = columns.iter().map(Column::to_sql).collect();
        sql.push_str(&list.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.source_sql(&state.from, Command::Select)?);
        for join in &state.joins {
            sql.push_str(&self.join_sql(join)?);
        }
        if !state.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&state.wheres.join(" AND "));
        }
        if !state.groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&state.groups.join(", "));
        }
        if !state.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&state.havings.join(" AND "));
        }

        // Derived tables and subqueries keep their ordering only when it
        // decides which rows are paged in.
        let keep_order = mode == Render::Top || state.is_paged();
        let order = (keep_order && !state.orders.is_empty()).then(|| state.orders.join(", "));
        let sql = self
            .dialect
            .paged(&sql, state.take, state.skip, order.as_deref());

        Ok(Rendered {
            sql,
            columns: columns.into_iter().map(|c| c.name).collect(),
            scalar,
        })
    }

    fn projection(&mut self, state: &SelectState, mode: Render) -> Result<(Vec<Column>, bool)> {
        let name_values = mode == Render::Derived;
        if mode == Render::Exists {
            let one = Column {
                sql: "1".to_string(),
                name: "1".to_string(),
                named: false,
            };
            return Ok((vec![one], false));
        }
        if let Some(aggregate) = &state.aggregate {
            return Ok((vec![value_column(aggregate.clone(), name_values)], true));
        }
        match &state.row {
            Row::Source(slot) => Ok(self.source_columns(*slot)),
            Row::Projected(members) => Ok((named_columns(members), false)),
            Row::Scalar(sql) => Ok((vec![value_column(sql.clone(), name_values)], true)),
            Row::Grouped { key, .. } => match key.as_ref() {
                Row::Scalar(sql) => Ok((
                    vec![Column {
                        sql: sql.clone(),
                        name: GROUP_KEY.to_string(),
                        named: true,
                    }],
                    false,
                )),
                Row::Projected(members) => Ok((named_columns(members), false)),
                _ => Err(SqlError::unsupported("grouping by a whole row")),
            },
            Row::Joined(_) => Err(SqlError::unsupported(
                "a joined row must be projected with `Select`",
            )),
        }
    }

    fn source_columns(&mut self, slot: SlotId) -> (Vec<Column>, bool) {
        if let Some(info) = self.aliases.table(slot).map(Arc::clone) {
            let columns = info
                .read_or_writes()
                .map(|(field, column)| Column {
                    sql: self.qualified(slot, column),
                    name: field.to_string(),
                    named: field != column,
                })
                .collect();
            return (columns, false);
        }
        if self.aliases.is_scalar(slot) {
            let column = Column {
                sql: self.qualified(slot, VALUE_COLUMN),
                name: VALUE_COLUMN.to_string(),
                named: false,
            };
            return (vec![column], true);
        }
        let names: Vec<String> = self
            .aliases
            .derived_columns(slot)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let columns = names
            .into_iter()
            .map(|name| Column {
                sql: self.qualified(slot, &name),
                name,
                named: false,
            })
            .collect();
        (columns, false)
    }

    /// Renders a FROM or JOIN target: `{COMMAND#table} [alias]` or
    /// `(SELECT ...) [alias]`.
    pub(crate) fn source_sql(&mut self, source: &Source, command: Command) -> Result<String> {
        match source {
            Source::Table(slot) => {
                let name = self
                    .aliases
                    .table(*slot)
                    .map(|info| info.name().to_string())
                    .unwrap_or_default();
                let mut sql = TableToken::new(command, name).to_string();
                if !self.aliases.is_bare(*slot) {
                    sql.push(' ');
                    sql.push_str(&field_token(&self.aliases.alias(*slot)));
                }
                Ok(sql)
            }
            Source::Derived { sql, slot } => Ok(format!(
                "({sql}) {}",
                field_token(&self.aliases.alias(*slot))
            )),
            Source::Compound(_) => Err(SqlError::unsupported(
                "a set operation must be wrapped before it is read from",
            )),
        }
    }

    pub(crate) fn join_sql(&mut self, join: &JoinClause) -> Result<String> {
        Ok(format!(
            " {} {} ON {}",
            join.kind.as_sql(),
            self.source_sql(&join.target, Command::Join)?,
            join.on
        ))
    }
}

fn value_column(sql: String, named: bool) -> Column {
    Column {
        sql,
        name: VALUE_COLUMN.to_string(),
        named,
    }
}

fn named_columns(members: &[(String, String)]) -> Vec<Column> {
    members
        .iter()
        .map(|(name, sql)| Column {
            sql: sql.clone(),
            name: name.clone(),
            named: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectState {
        SelectState::new(Source::Table(0), Row::Source(0))
    }

    #[test]
    fn test_take_then_skip_narrows() {
        let mut s = state();
        s.take(10).unwrap();
        s.skip(4).unwrap();
        assert_eq!((s.take, s.skip), (Some(6), 4));
        s.take(3).unwrap();
        assert_eq!(s.take, Some(3));
    }

    #[test]
    fn error_take_widening() {
        let mut s = state();
        s.take(2).unwrap();
        assert!(matches!(s.take(5), Err(SqlError::IndexOutOfRange(_))));
    }

    #[test]
    fn error_skip_past_take() {
        let mut s = state();
        s.take(3).unwrap();
        assert!(matches!(s.skip(3), Err(SqlError::IndexOutOfRange(_))));
    }

    #[test]
    fn test_flip_order() {
        let mut s = state();
        s.orders = vec!["[a]".into(), "[b] DESC".into()];
        s.flip_order();
        assert_eq!(s.orders, ["[a] DESC", "[b]"]);
    }

    #[test]
    fn error_from_end_without_order() {
        let mut s = state();
        assert!(matches!(s.from_end("TakeLast"), Err(SqlError::Syntax(_))));
    }

    #[test]
    fn test_column_alias_skipped_when_redundant() {
        let same = Column {
            sql: "[u].[name]".into(),
            name: "name".into(),
            named: true,
        };
        let renamed = Column {
            sql: "[u].[user_name]".into(),
            name: "name".into(),
            named: true,
        };
        assert_eq!(same.to_sql(), "[u].[name]");
        assert_eq!(renamed.to_sql(), "[u].[user_name] AS [name]");
    }
}
