//! Boolean sub-trees: WHERE and HAVING predicates, ON clauses, CASE tests.

use oxide_canon::{Comparison, Result, SqlError, SqlValue, Writer};

use super::alias::Scope;
use super::select::Render;
use super::Compiler;
use crate::query::{BinaryOp, Expr, Query, StringMethod};

/// Maximum number of values in one `IN (...)` list.
pub(crate) const IN_BATCH: usize = 256;

/// What compiling a condition produced.
///
/// Constant outcomes are reported as seen from the current NOT context and
/// write nothing, so the caller can drop or absorb them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Written,
    AlwaysTrue,
    AlwaysFalse,
}

impl Outcome {
    const fn constant(value: bool, reversed: bool) -> Self {
        if value == reversed {
            Self::AlwaysFalse
        } else {
            Self::AlwaysTrue
        }
    }
}

const fn comparison(op: BinaryOp) -> Option<Comparison> {
    match op {
        BinaryOp::Eq => Some(Comparison::Eq),
        BinaryOp::Ne => Some(Comparison::Ne),
        BinaryOp::Lt => Some(Comparison::Lt),
        BinaryOp::Le => Some(Comparison::Le),
        BinaryOp::Gt => Some(Comparison::Gt),
        BinaryOp::Ge => Some(Comparison::Ge),
        _ => None,
    }
}

const fn is_null(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Constant(SqlValue::Null)
            | Expr::Variable {
                value: SqlValue::Null,
                ..
            }
    )
}

impl Compiler<'_> {
    /// Compiles a boolean expression at the writer's cursor.
    pub(crate) fn condition(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<Outcome> {
        match expr {
            Expr::Constant(SqlValue::Bool(value)) => Ok(Outcome::constant(*value, w.is_reversed())),
            Expr::Not(inner) => w.reverse_condition(|w| self.condition(w, scope, inner)),
            Expr::Binary { op, left, right } if op.is_logical() => {
                self.logical(w, scope, *op, left, right)
            }
            Expr::Binary { op, left, right } => match comparison(*op) {
                Some(cmp) => self.compare(w, scope, cmp, left, right),
                None => self.truth(w, scope, expr),
            },
            Expr::Call {
                method,
                target,
                args,
            } if method.is_predicate() => self.string_predicate(w, scope, *method, target, args),
            Expr::InList { values, item } => self.in_list(w, scope, values, item),
            Expr::Query(query) => self.exists(w, scope, query),
            _ => self.truth(w, scope, expr),
        }
    }

    /// `value = TRUE` for boolean-valued expressions that are not predicates.
    fn truth(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<Outcome> {
        self.value(w, scope, expr)?;
        w.equal();
        w.parameter(SqlValue::Bool(true));
        Ok(Outcome::Written)
    }

    fn logical(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Outcome> {
        // AND turns into OR inside a NOT context and the other way round.
        let conjunction = (op == BinaryOp::AndAlso) != w.is_reversed();
        let (absorbing, neutral) = if conjunction {
            (Outcome::AlwaysFalse, Outcome::AlwaysTrue)
        } else {
            (Outcome::AlwaysTrue, Outcome::AlwaysFalse)
        };

        let start = w.len();
        let lhs = self.condition(w, scope, left)?;
        if lhs == absorbing {
            return Ok(absorbing);
        }
        let middle = w.len();
        let rhs = self.condition(w, scope, right)?;
        if rhs == absorbing {
            w.truncate(start);
            return Ok(absorbing);
        }

        match (lhs, rhs) {
            (Outcome::Written, Outcome::Written) => {
                w.set_append_at(Some(middle));
                if op == BinaryOp::AndAlso {
                    w.and();
                } else {
                    w.or();
                }
                w.set_append_at(Some(start));
                w.open_brace();
                w.set_append_at(None);
                w.close_brace();
                Ok(Outcome::Written)
            }
            (Outcome::Written, _) | (_, Outcome::Written) => Ok(Outcome::Written),
            _ => Ok(neutral),
        }
    }

    fn compare(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        cmp: Comparison,
        left: &Expr,
        right: &Expr,
    ) -> Result<Outcome> {
        if is_null(left) || is_null(right) {
            if is_null(left) && is_null(right) {
                return match cmp {
                    Comparison::Eq => Ok(Outcome::constant(true, w.is_reversed())),
                    Comparison::Ne => Ok(Outcome::constant(false, w.is_reversed())),
                    _ => Err(SqlError::unsupported("ordering comparison with NULL")),
                };
            }
            let operand = if is_null(right) { left } else { right };
            self.value(w, scope, operand)?;
            match cmp {
                Comparison::Eq => w.is_null(),
                Comparison::Ne => w.is_not_null(),
                _ => return Err(SqlError::unsupported("ordering comparison with NULL")),
            }
            return Ok(Outcome::Written);
        }
        self.value(w, scope, left)?;
        w.compare(cmp);
        self.value(w, scope, right)?;
        Ok(Outcome::Written)
    }

    fn string_predicate(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        method: StringMethod,
        target: &Expr,
        args: &[Expr],
    ) -> Result<Outcome> {
        if method == StringMethod::IsNullOrEmpty {
            w.open_brace();
            self.value(w, scope, target)?;
            w.is_null();
            w.or();
            self.value(w, scope, target)?;
            w.equal();
            w.empty_string();
            w.close_brace();
            return Ok(Outcome::Written);
        }

        let [pattern] = args else {
            return Err(SqlError::syntax(format!(
                "`{method:?}` takes one argument, found {}",
                args.len()
            )));
        };
        self.value(w, scope, target)?;
        w.like();
        if let Expr::Constant(SqlValue::Text(text)) = pattern {
            let pattern = match method {
                StringMethod::StartsWith => format!("{text}%"),
                StringMethod::EndsWith => format!("%{text}"),
                _ => format!("%{text}%"),
            };
            w.parameter(SqlValue::Text(pattern));
        } else {
            w.write("CONCAT(");
            if method != StringMethod::StartsWith {
                w.write("'%'");
                w.delimiter();
            }
            self.value(w, scope, pattern)?;
            if method != StringMethod::EndsWith {
                w.delimiter();
                w.write("'%'");
            }
            w.close_brace();
        }
        Ok(Outcome::Written)
    }

    fn in_list(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        values: &[SqlValue],
        item: &Expr,
    ) -> Result<Outcome> {
        if values.is_empty() {
            return Ok(Outcome::constant(false, w.is_reversed()));
        }
        let (item, ()) = w.nested(|child| self.value(child, scope, item))?;
        let batched = values.len() > IN_BATCH;
        if batched {
            w.open_brace();
        }
        for (i, batch) in values.chunks(IN_BATCH).enumerate() {
            if i > 0 {
                w.or();
            }
            w.write(&item);
            w.in_list();
            w.open_brace();
            for (j, value) in batch.iter().enumerate() {
                if j > 0 {
                    w.delimiter();
                }
                w.parameter(value.clone());
            }
            w.close_brace();
        }
        if batched {
            w.close_brace();
        }
        Ok(Outcome::Written)
    }

    /// Compiles `Any`, `All` and `Contains` over a query.
    pub(crate) fn exists(&mut self, w: &mut Writer, scope: &Scope, query: &Query) -> Result<Outcome> {
        match query {
            Query::Any { source, predicate } => {
                let mut state = self.select_state(w, source, scope)?;
                if let Some(predicate) = predicate {
                    state = self.filter(w, state, predicate, scope, false)?;
                }
                let sql = self.render_select(&state, Render::Exists)?.sql;
                w.exists();
                w.write(" (");
                w.write(&sql);
                w.close_brace();
            }
            Query::All { source, predicate } => {
                let state = self.select_state(w, source, scope)?;
                let state = self.filter(w, state, predicate, scope, true)?;
                let sql = self.render_select(&state, Render::Exists)?.sql;
                w.reverse_condition(Writer::exists);
                w.write(" (");
                w.write(&sql);
                w.close_brace();
            }
            Query::Contains { source, item } => {
                let state = self.select_state(w, source, scope)?;
                let rendered = self.render_select(&state, Render::Subquery)?;
                if rendered.columns.len() != 1 {
                    return Err(SqlError::unsupported(
                        "`Contains` needs a query projecting a single value",
                    ));
                }
                self.value(w, scope, item)?;
                w.in_list();
                w.open_brace();
                w.write(&rendered.sql);
                w.close_brace();
            }
            other => {
                return Err(SqlError::unsupported(format!(
                    "`{}` is not a condition",
                    other.operator()
                )))
            }
        }
        Ok(Outcome::Written)
    }
}
