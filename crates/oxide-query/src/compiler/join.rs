//! Joins.

use oxide_canon::{Result, SqlError, Writer};

use super::alias::{Row, Scope};
use super::select::{JoinClause, Render, SelectState, Source};
use super::Compiler;
use crate::query::{Expr, Query};

impl Compiler<'_> {
    /// Joins `state` with the inner query of a `Join` node.
    ///
    /// A plain table joins as `JOIN {JOIN#table} [alias]`; any other query
    /// joins as a derived table `JOIN (SELECT ...) [alias]`.
    pub(crate) fn join(
        &mut self,
        w: &mut Writer,
        mut state: SelectState,
        query: &Query,
        scope: &Scope,
    ) -> Result<SelectState> {
        let Query::Join {
            kind,
            inner,
            outer_key,
            inner_key,
            result,
            ..
        } = query
        else {
            return Err(SqlError::unsupported(format!(
                "`{}` is not a join",
                query.operator()
            )));
        };
        if state.is_paged() || state.distinct || state.grouped {
            state = self.wrap(state)?;
        }

        let (target, inner_row) = match inner.as_ref() {
            Query::Table(entity) => {
                let info = self.resolver.resolve(entity)?;
                let slot = self.aliases.add_table(info, false);
                (Source::Table(slot), Row::Source(slot))
            }
            other => {
                let inner_state = self.select_state(w, other, scope)?;
                let rendered = self.render_select(&inner_state, Render::Derived)?;
                let slot = self.aliases.add_derived(rendered.columns, rendered.scalar);
                let source = Source::Derived {
                    sql: rendered.sql,
                    slot,
                };
                (source, Row::Source(slot))
            }
        };

        let outer_scope = self.bind(scope, outer_key, &state.row)?;
        let inner_scope = self.bind(scope, inner_key, &inner_row)?;
        let on = self.join_condition(
            w,
            (&outer_scope, outer_key.body()),
            (&inner_scope, inner_key.body()),
        )?;

        let [outer_param, inner_param] = result.params() else {
            return Err(SqlError::syntax(format!(
                "a join result selector takes two parameters, found {}",
                result.params().len()
            )));
        };
        let result_scope = self.bind_param(scope, outer_param, &state.row);
        let result_scope = self.bind_param(&result_scope, inner_param, &inner_row);
        let row = self.shape(w, &result_scope, result.body())?;

        state.joins.push(JoinClause {
            kind: *kind,
            target,
            on,
        });
        state.row = row;
        Ok(state)
    }

    /// `outer = inner`, member by member for composite keys.
    fn join_condition(
        &mut self,
        w: &mut Writer,
        outer: (&Scope, &Expr),
        inner: (&Scope, &Expr),
    ) -> Result<String> {
        let pairs: Vec<(&Expr, &Expr)> = match (outer.1, inner.1) {
            (Expr::New(left), Expr::New(right)) => {
                if left.len() != right.len() {
                    return Err(SqlError::syntax(format!(
                        "composite join keys differ in size: {} and {}",
                        left.len(),
                        right.len()
                    )));
                }
                left.iter()
                    .zip(right)
                    .map(|((_, l), (_, r))| (l, r))
                    .collect()
            }
            (Expr::New(_), _) | (_, Expr::New(_)) => {
                return Err(SqlError::syntax(
                    "a composite join key must be matched by a composite key",
                ))
            }
            (left, right) => vec![(left, right)],
        };

        let mut parts = Vec::with_capacity(pairs.len());
        for (left, right) in pairs {
            let left = self.value_sql(w, outer.0, left)?;
            let right = self.value_sql(w, inner.0, right)?;
            parts.push(format!("{left} = {right}"));
        }
        Ok(parts.join(" AND "))
    }
}
