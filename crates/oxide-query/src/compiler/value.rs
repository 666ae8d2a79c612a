//! Value expressions: columns, parameters, arithmetic, string functions.

use oxide_canon::token::field_token;
use oxide_canon::{Result, SqlError, SqlValue, Writer};

use super::alias::{Row, Scope, SlotId, VALUE_COLUMN};
use super::condition::Outcome;
use super::select::Render;
use super::Compiler;
use crate::query::{AggregateFn, BinaryOp, Expr, Lambda, Query, StringMethod, GROUP_KEY};

/// A member path resolved against the scope.
#[derive(Debug)]
pub(crate) enum Resolved {
    Row(Row),
    Column(String),
}

impl Compiler<'_> {
    /// Writes `[alias].[column]` for a column of `slot`.
    pub(crate) fn qualified(&mut self, slot: SlotId, column: &str) -> String {
        let alias = self.aliases.alias(slot);
        format!("{}.{}", field_token(&alias), field_token(column))
    }

    /// Resolves a parameter or member chain. Returns `None` for any other
    /// expression.
    pub(crate) fn resolve(&mut self, scope: &Scope, expr: &Expr) -> Result<Option<Resolved>> {
        match expr {
            Expr::Param(name) => {
                let row = scope
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SqlError::syntax(format!("unknown lambda parameter `{name}`")))?;
                Ok(Some(self.settle(row)))
            }
            Expr::Member { target, field } => match self.resolve(scope, target)? {
                Some(target) => self.member(target, field).map(Some),
                None => Err(SqlError::unsupported(format!(
                    "member `{field}` of a computed value"
                ))),
            },
            _ => Ok(None),
        }
    }

    fn settle(&mut self, row: Row) -> Resolved {
        match row {
            Row::Scalar(sql) => Resolved::Column(sql),
            Row::Source(slot) if self.aliases.is_scalar(slot) => {
                Resolved::Column(self.qualified(slot, VALUE_COLUMN))
            }
            row => Resolved::Row(row),
        }
    }

    fn member(&mut self, target: Resolved, field: &str) -> Result<Resolved> {
        let Resolved::Row(row) = target else {
            return Err(SqlError::unsupported(format!(
                "member `{field}` of a scalar value"
            )));
        };
        match row {
            Row::Source(slot) => {
                let column = if let Some(info) = self.aliases.table(slot) {
                    info.column(field).map(str::to_string).ok_or_else(|| {
                        SqlError::schema(format!(
                            "`{field}` is not a readable field of `{}`",
                            info.name()
                        ))
                    })?
                } else {
                    let known = self
                        .aliases
                        .derived_columns(slot)
                        .is_some_and(|columns| columns.iter().any(|c| c == field));
                    if !known {
                        return Err(SqlError::schema(format!(
                            "`{field}` is not a column of the derived table"
                        )));
                    }
                    field.to_string()
                };
                Ok(Resolved::Column(self.qualified(slot, &column)))
            }
            Row::Joined(members) => {
                let row = members
                    .into_iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, row)| row)
                    .ok_or_else(|| SqlError::syntax(format!("unknown member `{field}`")))?;
                Ok(self.settle(row))
            }
            Row::Projected(members) => members
                .into_iter()
                .find(|(name, _)| name == field)
                .map(|(_, sql)| Resolved::Column(sql))
                .ok_or_else(|| SqlError::syntax(format!("unknown member `{field}`"))),
            Row::Grouped { key, .. } if field == GROUP_KEY => Ok(self.settle(*key)),
            Row::Grouped { .. } => Err(SqlError::unsupported(format!(
                "member `{field}` of a group; use the key or an aggregate"
            ))),
            Row::Scalar(_) => Err(SqlError::unsupported(format!(
                "member `{field}` of a scalar value"
            ))),
        }
    }

    /// Compiles a value at the writer's cursor.
    ///
    /// Values never depend on the NOT context: everything reversal-aware is
    /// compiled in a nested writer first.
    pub(crate) fn value(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<()> {
        if let Some(resolved) = self.resolve(scope, expr)? {
            return match resolved {
                Resolved::Column(sql) => {
                    w.write(&sql);
                    Ok(())
                }
                Resolved::Row(_) => Err(SqlError::unsupported(
                    "a whole row cannot be used as a value",
                )),
            };
        }
        match expr {
            Expr::Constant(SqlValue::Null) => w.write("NULL"),
            Expr::Constant(value) => {
                w.parameter(value.clone());
            }
            Expr::Variable { name, value } => w.parameter_named(name, value.clone())?,
            Expr::Binary {
                op: BinaryOp::Concat,
                left,
                right,
            } => {
                w.write("CONCAT(");
                self.value(w, scope, left)?;
                w.delimiter();
                self.value(w, scope, right)?;
                w.close_brace();
            }
            Expr::Binary { op, left, right } => match op.arithmetic_symbol() {
                Some(symbol) => {
                    w.open_brace();
                    self.value(w, scope, left)?;
                    w.white_space();
                    w.write(symbol);
                    w.white_space();
                    self.value(w, scope, right)?;
                    w.close_brace();
                }
                None => self.predicate_value(w, scope, expr)?,
            },
            Expr::Not(_) | Expr::InList { .. } => self.predicate_value(w, scope, expr)?,
            Expr::Call { method, .. } if method.is_predicate() => {
                self.predicate_value(w, scope, expr)?;
            }
            Expr::Call {
                method,
                target,
                args,
            } => self.string_call(w, scope, *method, target, args)?,
            Expr::Negate(inner) => {
                w.write("-(");
                self.value(w, scope, inner)?;
                w.close_brace();
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let (test, outcome) = w.nested(|child| self.condition(child, scope, test))?;
                match outcome {
                    Outcome::AlwaysTrue => self.value(w, scope, if_true)?,
                    Outcome::AlwaysFalse => self.value(w, scope, if_false)?,
                    Outcome::Written => {
                        w.write("CASE WHEN ");
                        w.write(&test);
                        w.write(" THEN ");
                        self.value(w, scope, if_true)?;
                        w.write(" ELSE ");
                        self.value(w, scope, if_false)?;
                        w.write(" END");
                    }
                }
            }
            Expr::Coalesce(value, fallback) => {
                w.write("COALESCE(");
                self.value(w, scope, value)?;
                w.delimiter();
                self.value(w, scope, fallback)?;
                w.close_brace();
            }
            Expr::New(_) => {
                return Err(SqlError::unsupported(
                    "an object initializer cannot be used as a value",
                ))
            }
            Expr::Query(query) => self.subquery_value(w, scope, query)?,
            Expr::Aggregate {
                group,
                func,
                selector,
            } => self.group_aggregate(w, scope, group, *func, selector.as_deref())?,
            Expr::Param(_) | Expr::Member { .. } => {
                return Err(SqlError::unsupported("unresolvable member access"))
            }
        }
        Ok(())
    }

    /// Compiles a value into its own buffer.
    pub(crate) fn value_sql(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<String> {
        w.nested(|child| self.value(child, scope, expr))
            .map(|(sql, ())| sql)
    }

    fn string_call(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        method: StringMethod,
        target: &Expr,
        args: &[Expr],
    ) -> Result<()> {
        let target = self.value_sql(w, scope, target)?;
        let mut compiled = Vec::with_capacity(args.len());
        for arg in args {
            compiled.push(self.value_sql(w, scope, arg)?);
        }

        match (method, compiled.as_slice()) {
            (StringMethod::Substring, [start]) => {
                substring_guard(w, &target, start);
                w.length();
                w.write(&format!("({target}) - {start}) END"));
            }
            (StringMethod::Substring, [start, length]) => {
                substring_guard(w, &target, start);
                w.write(length);
                w.write(") END");
            }
            (StringMethod::IndexOf, [needle]) => {
                w.write(&format!("CASE WHEN {target} IS NULL THEN -1 ELSE "));
                w.index_of();
                w.write(&format!("({target}, {needle}) - 1 END"));
            }
            (StringMethod::Replace, [from, to]) => {
                w.write(&format!("REPLACE({target}, {from}, {to})"));
            }
            (StringMethod::ToUpper, []) => w.write(&format!("UPPER({target})")),
            (StringMethod::ToLower, []) => w.write(&format!("LOWER({target})")),
            (StringMethod::Trim, []) => w.write(&format!("LTRIM(RTRIM({target}))")),
            (StringMethod::TrimStart, []) => w.write(&format!("LTRIM({target})")),
            (StringMethod::TrimEnd, []) => w.write(&format!("RTRIM({target})")),
            (StringMethod::Length, []) => {
                w.length();
                w.write(&format!("({target})"));
            }
            (method, args) => {
                return Err(SqlError::syntax(format!(
                    "`{method:?}` does not take {} argument(s)",
                    args.len()
                )))
            }
        }
        Ok(())
    }

    /// Writes a boolean expression as a value:
    /// `CASE WHEN <condition> THEN TRUE ELSE FALSE END`.
    pub(crate) fn predicate_value(&mut self, w: &mut Writer, scope: &Scope, expr: &Expr) -> Result<()> {
        self.predicate_value_with(w, |this, child| this.condition(child, scope, expr))
    }

    pub(crate) fn predicate_value_with<F>(&mut self, w: &mut Writer, compile: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &mut Writer) -> Result<Outcome>,
    {
        let (sql, outcome) = w.nested(|child| compile(self, child))?;
        match outcome {
            Outcome::AlwaysTrue => w.write("TRUE"),
            Outcome::AlwaysFalse => w.write("FALSE"),
            Outcome::Written => {
                w.write("CASE WHEN ");
                w.write(&sql);
                w.write(" THEN TRUE ELSE FALSE END");
            }
        }
        Ok(())
    }

    fn subquery_value(&mut self, w: &mut Writer, scope: &Scope, query: &Query) -> Result<()> {
        if matches!(
            query,
            Query::Any { .. } | Query::All { .. } | Query::Contains { .. }
        ) {
            return self.predicate_value_with(w, |this, child| this.exists(child, scope, query));
        }
        let state = self.select_state(w, query, scope)?;
        let rendered = self.render_select(&state, Render::Subquery)?;
        if rendered.columns.len() != 1 {
            return Err(SqlError::unsupported(
                "a subquery used as a value must project a single column",
            ));
        }
        w.open_brace();
        w.write(&rendered.sql);
        w.close_brace();
        Ok(())
    }

    fn group_aggregate(
        &mut self,
        w: &mut Writer,
        scope: &Scope,
        group: &str,
        func: AggregateFn,
        selector: Option<&Lambda>,
    ) -> Result<()> {
        let element = match scope.get(group) {
            Some(Row::Grouped { element, .. }) => (**element).clone(),
            Some(_) => return Err(SqlError::syntax(format!("`{group}` is not a group"))),
            None => {
                return Err(SqlError::syntax(format!(
                    "unknown lambda parameter `{group}`"
                )))
            }
        };
        let argument = match selector {
            Some(lambda) if !func.is_count() => {
                let inner = self.bind(scope, lambda, &element)?;
                Some(self.value_sql(w, &inner, lambda.body())?)
            }
            _ if func.is_count() => None,
            _ => return Err(SqlError::syntax(format!("`{func}` needs a selector"))),
        };
        w.write(&func.to_sql(argument.as_deref()));
        Ok(())
    }
}

/// Writes `CASE WHEN LENGTH(x) - s < 1 THEN '' ELSE SUBSTRING(x, s + 1, `.
/// The start offset is 0-based; SQL offsets are 1-based.
fn substring_guard(w: &mut Writer, target: &str, start: &str) {
    w.write("CASE WHEN ");
    w.length();
    w.write(&format!("({target}) - {start} < 1 THEN "));
    w.empty_string();
    w.write(" ELSE ");
    w.substring();
    w.write(&format!("({target}, {start} + 1, "));
}
