//! Canonical SQL writer and parameter binder.
//!
//! The writer accumulates canonical SQL text and the parameters it binds.
//! It supports a retroactive-edit protocol: callers record [`Writer::len`]
//! before compiling a sub-expression and compare it afterwards. When nothing
//! was written they [`Writer::remove`] any dangling prefix; when something
//! was written they may [`Writer::set_append_at`] the boundary and splice an
//! operator or parenthesis into text that is already in the buffer.
//!
//! ```rust
//! use oxide_canon::writer::Writer;
//!
//! let mut w = Writer::new();
//! let start = w.len();
//! w.name(Some("x"), "age");
//! w.write(" > 18");
//! let middle = w.len();
//! w.name(Some("x"), "active");
//! w.write(" = 1");
//!
//! // Both sides produced output: splice the operator and the braces.
//! w.set_append_at(Some(middle));
//! w.and();
//! w.set_append_at(Some(start));
//! w.open_brace();
//! w.set_append_at(None);
//! w.close_brace();
//!
//! assert_eq!(w.as_str(), "([x].[age] > 18 AND [x].[active] = 1)");
//! ```

use std::fmt;

use tracing::trace;

use crate::error::{Result, SqlError};
use crate::token::{is_parameter_name, Command};
use crate::value::SqlValue;

/// Prefix of synthesized names for anonymous parameters.
pub const ANONYMOUS_PREFIX: &str = "__variable_";

/// Ordered parameter map.
///
/// Insertion order is preserved. Inserting an existing name replaces the
/// value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<(String, SqlValue)>,
}

impl Parameters {
    /// Creates an empty parameter map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binds `value` under `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue) -> Option<SqlValue> {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((name, value));
        None
    }

    /// Returns the value bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns whether `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no parameter is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the parameter names in binding order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl IntoIterator for Parameters {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Comparison operators understood by [`Writer::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    /// Returns the logical complement of the operator.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
        }
    }

    /// Returns the SQL spelling of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-compilation canonical SQL buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buffer: String,
    append_at: Option<usize>,
    reversed: bool,
    parameters: Parameters,
    anonymous: usize,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current length of the buffer in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the pending splice position.
    #[must_use]
    pub const fn append_at(&self) -> Option<usize> {
        self.append_at
    }

    /// Sets the splice position. `None` resumes appending at the end.
    pub fn set_append_at(&mut self, at: Option<usize>) {
        self.append_at = at.map(|pos| pos.min(self.buffer.len()));
    }

    /// Removes `len` bytes starting at `start`.
    pub fn remove(&mut self, start: usize, len: usize) {
        let end = (start + len).min(self.buffer.len());
        if start >= end {
            return;
        }
        self.buffer.replace_range(start..end, "");
        if let Some(at) = self.append_at {
            if at > start {
                self.append_at = Some(start.max(at.saturating_sub(end - start)));
            }
        }
    }

    /// Truncates the buffer back to `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        let current = self.buffer.len();
        if len < current {
            self.remove(len, current - len);
        }
    }

    /// Writes raw text at the cursor.
    pub fn write(&mut self, text: &str) {
        match self.append_at {
            Some(at) => {
                self.buffer.insert_str(at, text);
                self.append_at = Some(at + text.len());
            }
            None => self.buffer.push_str(text),
        }
    }

    /// Writes `(`.
    pub fn open_brace(&mut self) {
        self.write("(");
    }

    /// Writes `)`.
    pub fn close_brace(&mut self) {
        self.write(")");
    }

    /// Writes a single space.
    pub fn white_space(&mut self) {
        self.write(" ");
    }

    /// Writes the argument delimiter `, `.
    pub fn delimiter(&mut self) {
        self.write(", ");
    }

    /// Writes ` WHERE `.
    pub fn where_clause(&mut self) {
        self.write(" WHERE ");
    }

    /// Writes ` AND `, or ` OR ` inside a reversed condition.
    pub fn and(&mut self) {
        self.write(if self.reversed { " OR " } else { " AND " });
    }

    /// Writes ` OR `, or ` AND ` inside a reversed condition.
    pub fn or(&mut self) {
        self.write(if self.reversed { " AND " } else { " OR " });
    }

    /// Writes a field token, optionally qualified: `[prefix].[field]`.
    pub fn name(&mut self, prefix: Option<&str>, field: &str) {
        if let Some(prefix) = prefix {
            self.write("[");
            self.write(prefix);
            self.write("].");
        }
        self.write("[");
        self.write(field);
        self.write("]");
    }

    /// Writes a `{COMMAND#name}` table token.
    pub fn table_name(&mut self, command: Command, name: &str) {
        self.write("{");
        self.write(command.as_str());
        self.write("#");
        self.write(name);
        self.write("}");
    }

    /// Writes a table alias: ` [alias]`.
    pub fn alias(&mut self, alias: &str) {
        self.write(" [");
        self.write(alias);
        self.write("]");
    }

    /// Writes a column alias: ` AS [alias]`.
    pub fn as_name(&mut self, alias: &str) {
        self.write(" AS [");
        self.write(alias);
        self.write("]");
    }

    /// Binds an anonymous value under a synthesized name and writes its
    /// token. Returns the synthesized name.
    pub fn parameter(&mut self, value: SqlValue) -> String {
        self.anonymous += 1;
        let name = format!("{ANONYMOUS_PREFIX}{}", self.anonymous);
        self.parameters.insert(name.clone(), value);
        self.write("{");
        self.write(&name);
        self.write("}");
        name
    }

    /// Binds `value` under `name` and writes its token.
    ///
    /// A name that is already bound is overwritten (last write wins). Names
    /// starting with [`ANONYMOUS_PREFIX`] belong to [`Writer::parameter`] and
    /// are rejected.
    pub fn parameter_named(&mut self, name: &str, value: SqlValue) -> Result<()> {
        if !is_parameter_name(name) {
            return Err(SqlError::syntax(format!(
                "`{name}` is not a valid parameter name"
            )));
        }
        if name.starts_with(ANONYMOUS_PREFIX) {
            return Err(SqlError::syntax(format!(
                "`{name}` uses the reserved prefix `{ANONYMOUS_PREFIX}`"
            )));
        }
        if let Some(previous) = self.parameters.insert(name, value) {
            trace!(name, %previous, "parameter rebound");
        }
        self.write("{");
        self.write(name);
        self.write("}");
        Ok(())
    }

    /// Writes ` LIKE `, or ` NOT LIKE ` inside a reversed condition.
    pub fn like(&mut self) {
        self.write(if self.reversed { " NOT LIKE " } else { " LIKE " });
    }

    /// Writes ` = `, or ` <> ` inside a reversed condition.
    pub fn equal(&mut self) {
        self.compare(Comparison::Eq);
    }

    /// Writes ` <> `, or ` = ` inside a reversed condition.
    pub fn not_equal(&mut self) {
        self.compare(Comparison::Ne);
    }

    /// Writes a comparison operator, negated inside a reversed condition.
    pub fn compare(&mut self, op: Comparison) {
        let op = if self.reversed { op.negate() } else { op };
        self.write(" ");
        self.write(op.as_str());
        self.write(" ");
    }

    /// Writes ` IS NULL`, or ` IS NOT NULL` inside a reversed condition.
    pub fn is_null(&mut self) {
        self.write(if self.reversed { " IS NOT NULL" } else { " IS NULL" });
    }

    /// Writes ` IS NOT NULL`, or ` IS NULL` inside a reversed condition.
    pub fn is_not_null(&mut self) {
        self.write(if self.reversed { " IS NULL" } else { " IS NOT NULL" });
    }

    /// Writes `EXISTS`, or `NOT EXISTS` inside a reversed condition.
    pub fn exists(&mut self) {
        self.write(if self.reversed { "NOT EXISTS" } else { "EXISTS" });
    }

    /// Writes ` IN `, or ` NOT IN ` inside a reversed condition.
    pub fn in_list(&mut self) {
        self.write(if self.reversed { " NOT IN " } else { " IN " });
    }

    /// Writes the canonical `LENGTH` builtin name.
    pub fn length(&mut self) {
        self.write("LENGTH");
    }

    /// Writes the canonical `SUBSTRING` builtin name.
    pub fn substring(&mut self) {
        self.write("SUBSTRING");
    }

    /// Writes the canonical `INDEXOF` builtin name.
    ///
    /// The canonical argument order is `(haystack, needle)`; the formatter
    /// swaps it for engines that expect the needle first.
    pub fn index_of(&mut self) {
        self.write("INDEXOF");
    }

    /// Writes the empty string literal `''`.
    pub fn empty_string(&mut self) {
        self.write("''");
    }

    /// Writes ` ORDER BY `.
    pub fn order_by(&mut self) {
        self.write(" ORDER BY ");
    }

    /// Writes ` DESC`.
    pub fn descending(&mut self) {
        self.write(" DESC");
    }

    /// Returns whether the writer is inside a reversed (NOT) condition.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Runs `action` with the NOT context toggled.
    ///
    /// Nested calls cancel out, so `NOT (NOT x)` compiles as `x`.
    pub fn reverse_condition<T>(&mut self, action: impl FnOnce(&mut Self) -> T) -> T {
        self.reversed = !self.reversed;
        let result = action(self);
        self.reversed = !self.reversed;
        result
    }

    /// Renders a sub-statement into an isolated buffer.
    ///
    /// The nested writer starts outside any NOT context and with no splice
    /// cursor, but shares this writer's parameter map and anonymous name
    /// counter, so parameters bound inside the sub-statement stay unique.
    pub fn nested<T>(&mut self, action: impl FnOnce(&mut Self) -> Result<T>) -> Result<(String, T)> {
        let mut child = Self {
            buffer: String::new(),
            append_at: None,
            reversed: false,
            parameters: std::mem::take(&mut self.parameters),
            anonymous: self.anonymous,
        };
        let result = action(&mut child);
        self.parameters = child.parameters;
        self.anonymous = child.anonymous;
        result.map(|value| (child.buffer, value))
    }

    /// Returns the text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Returns the parameters bound so far.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Consumes the writer, returning the canonical SQL and its parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Parameters) {
        (self.buffer, self.parameters)
    }
}

impl fmt::Display for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}
