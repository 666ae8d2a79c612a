//! `Union`, `Concat`, `Except` and `Intersect`.

use oxide_canon::{Result, SqlError, Writer};

use super::alias::{Row, Scope};
use super::select::{Render, Rendered, SelectState, Source};
use super::Compiler;
use crate::query::{Query, SetOperator};

impl Compiler<'_> {
    /// Compiles both arms independently and joins them with the set
    /// operator. The result stays a bare compound statement until another
    /// operator reads from it.
    pub(crate) fn set_op(
        &mut self,
        w: &mut Writer,
        left: &Query,
        op: SetOperator,
        right: &Query,
        scope: &Scope,
    ) -> Result<SelectState> {
        let left = self.set_arm(w, left, scope)?;
        let right = self.set_arm(w, right, scope)?;
        if left.columns.len() != right.columns.len() {
            return Err(SqlError::syntax(format!(
                "{} of queries with {} and {} columns",
                op.as_sql(),
                left.columns.len(),
                right.columns.len()
            )));
        }
        let row = Row::Projected(
            left.columns
                .iter()
                .map(|c| (c.clone(), oxide_canon::token::field_token(c)))
                .collect(),
        );
        let compound = Rendered {
            sql: format!("{} {} {}", left.sql, op.as_sql(), right.sql),
            columns: left.columns,
            scalar: left.scalar,
        };
        Ok(SelectState::new(Source::Compound(compound), row))
    }

    fn set_arm(&mut self, w: &mut Writer, query: &Query, scope: &Scope) -> Result<Rendered> {
        let state = self.select_state(w, query, scope)?;
        if let Some(terminal) = state.terminal {
            return Err(SqlError::unsupported(format!(
                "`{terminal}` cannot be combined with a set operator"
            )));
        }
        // Paging must not leak into the combined statement.
        let state = if state.is_paged() {
            self.wrap(state)?
        } else {
            state
        };
        self.render_select(&state, Render::Derived)
    }
}
