//! Expression trees.
//!
//! Expressions are built with small constructor functions and combinator
//! methods, in the spirit of a LINQ expression tree:
//!
//! ```rust
//! use oxide_query::query::{member, Lambda};
//!
//! // u => u.age > 18 && u.name.StartsWith("A")
//! let predicate = Lambda::new(
//!     "u",
//!     member("u", "age").gt(18).and(member("u", "name").starts_with("A")),
//! );
//! assert_eq!(predicate.params(), ["u"]);
//! ```

use oxide_canon::{SqlError, SqlValue, ToSqlValue};

use super::aggregates::AggregateFn;
use super::Query;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    AndAlso,
    /// `||`
    OrElse,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// String concatenation.
    Concat,
}

impl BinaryOp {
    /// Returns whether the operator compares its operands.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    /// Returns whether the operator is `&&` or `||`.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::AndAlso | Self::OrElse)
    }

    pub(crate) const fn arithmetic_symbol(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+"),
            Self::Subtract => Some("-"),
            Self::Multiply => Some("*"),
            Self::Divide => Some("/"),
            Self::Modulo => Some("%"),
            Self::BitAnd => Some("&"),
            Self::BitOr => Some("|"),
            Self::BitXor => Some("^"),
            _ => None,
        }
    }
}

/// String methods with a SQL translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMethod {
    /// `s.Contains(x)`
    Contains,
    /// `s.StartsWith(x)`
    StartsWith,
    /// `s.EndsWith(x)`
    EndsWith,
    /// `string.IsNullOrEmpty(s)`
    IsNullOrEmpty,
    /// `s.Substring(start)` or `s.Substring(start, length)`, 0-based.
    Substring,
    /// `s.IndexOf(x)`, 0-based, `-1` when absent.
    IndexOf,
    /// `s.Replace(a, b)`
    Replace,
    /// `s.ToUpper()`
    ToUpper,
    /// `s.ToLower()`
    ToLower,
    /// `s.Trim()`
    Trim,
    /// `s.TrimStart()`
    TrimStart,
    /// `s.TrimEnd()`
    TrimEnd,
    /// `s.Length`
    Length,
}

impl StringMethod {
    /// Returns whether the method yields a boolean.
    #[must_use]
    pub const fn is_predicate(self) -> bool {
        matches!(
            self,
            Self::Contains | Self::StartsWith | Self::EndsWith | Self::IsNullOrEmpty
        )
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A lambda parameter.
    Param(String),
    /// Member access: `target.field`.
    Member {
        /// The object being accessed.
        target: Box<Expr>,
        /// The member name.
        field: String,
    },
    /// A literal value, bound as an anonymous parameter.
    Constant(SqlValue),
    /// A captured variable, bound as a named parameter.
    Variable {
        /// Parameter name.
        name: String,
        /// Current value.
        value: SqlValue,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// Arithmetic negation.
    Negate(Box<Expr>),
    /// `test ? if_true : if_false`
    Conditional {
        /// The condition.
        test: Box<Expr>,
        /// Value when the condition holds.
        if_true: Box<Expr>,
        /// Value otherwise.
        if_false: Box<Expr>,
    },
    /// `value ?? fallback`
    Coalesce(Box<Expr>, Box<Expr>),
    /// A string method call.
    Call {
        /// The method.
        method: StringMethod,
        /// The string the method is called on.
        target: Box<Expr>,
        /// Method arguments.
        args: Vec<Expr>,
    },
    /// `values.Contains(item)` over an in-memory collection.
    InList {
        /// The collection.
        values: Vec<SqlValue>,
        /// The item looked up.
        item: Box<Expr>,
    },
    /// An object initializer: `new { a = x, b = y }`.
    New(Vec<(String, Expr)>),
    /// A nested query.
    Query(Box<Query>),
    /// An aggregate over the elements of a group: `g.Sum(x => x.v)`.
    Aggregate {
        /// The group parameter.
        group: String,
        /// The aggregate function.
        func: AggregateFn,
        /// The element selector, if the function takes one.
        selector: Option<Box<Lambda>>,
    },
}

/// Member name of a group's key.
pub const GROUP_KEY: &str = "key";

/// Creates a lambda parameter reference.
#[must_use]
pub fn param(name: &str) -> Expr {
    Expr::Param(name.to_string())
}

/// Creates `param.field`.
#[must_use]
pub fn member(param: &str, field: &str) -> Expr {
    Expr::Param(param.to_string()).field(field)
}

/// Creates a literal value.
pub fn value<V: ToSqlValue>(value: V) -> Expr {
    Expr::Constant(value.to_sql_value())
}

/// Creates a named variable.
pub fn variable<V: ToSqlValue>(name: &str, value: V) -> Expr {
    Expr::Variable {
        name: name.to_string(),
        value: value.to_sql_value(),
    }
}

/// Creates an object initializer.
#[must_use]
pub fn object<I, S>(members: I) -> Expr
where
    I: IntoIterator<Item = (S, Expr)>,
    S: Into<String>,
{
    Expr::New(
        members
            .into_iter()
            .map(|(name, expr)| (name.into(), expr))
            .collect(),
    )
}

/// Creates `values.Contains(item)` over an in-memory collection.
pub fn in_list<V, I>(values: I, item: impl Into<Expr>) -> Expr
where
    V: ToSqlValue,
    I: IntoIterator<Item = V>,
{
    Expr::InList {
        values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        item: Box::new(item.into()),
    }
}

/// Creates `test ? if_true : if_false`.
pub fn condition(test: impl Into<Expr>, if_true: impl Into<Expr>, if_false: impl Into<Expr>) -> Expr {
    Expr::Conditional {
        test: Box::new(test.into()),
        if_true: Box::new(if_true.into()),
        if_false: Box::new(if_false.into()),
    }
}

/// Creates `string.IsNullOrEmpty(target)`.
pub fn is_null_or_empty(target: impl Into<Expr>) -> Expr {
    Expr::Call {
        method: StringMethod::IsNullOrEmpty,
        target: Box::new(target.into()),
        args: Vec::new(),
    }
}

/// Creates `group.Key`.
#[must_use]
pub fn group_key(group: &str) -> Expr {
    member(group, GROUP_KEY)
}

/// Creates `group.Count()`.
#[must_use]
pub fn group_count(group: &str) -> Expr {
    Expr::Aggregate {
        group: group.to_string(),
        func: AggregateFn::Count,
        selector: None,
    }
}

/// Creates an aggregate over a group's elements: `group.Sum(selector)`.
#[must_use]
pub fn group_aggregate(group: &str, func: AggregateFn, selector: Lambda) -> Expr {
    Expr::Aggregate {
        group: group.to_string(),
        func,
        selector: Some(Box::new(selector)),
    }
}

impl Expr {
    fn binary(self, op: BinaryOp, other: impl Into<Self>) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other.into()),
        }
    }

    fn call(self, method: StringMethod, args: Vec<Self>) -> Self {
        Self::Call {
            method,
            target: Box::new(self),
            args,
        }
    }

    /// Accesses a member of this expression.
    #[must_use]
    pub fn field(self, field: &str) -> Self {
        Self::Member {
            target: Box::new(self),
            field: field.to_string(),
        }
    }

    /// `self == other`
    #[must_use]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self != other`
    #[must_use]
    pub fn ne(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Ne, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn le(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn ge(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    /// `self && other`
    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::AndAlso, other)
    }

    /// `self || other`
    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::OrElse, other)
    }

    /// `!self`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `-self`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Self::Negate(Box::new(self))
    }

    /// `self + other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// `self - other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Subtract, other)
    }

    /// `self * other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Multiply, other)
    }

    /// `self / other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Divide, other)
    }

    /// `self % other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn rem(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Modulo, other)
    }

    /// `self & other`
    #[must_use]
    pub fn bit_and(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::BitAnd, other)
    }

    /// `self | other`
    #[must_use]
    pub fn bit_or(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::BitOr, other)
    }

    /// `self ^ other`
    #[must_use]
    pub fn bit_xor(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::BitXor, other)
    }

    /// String concatenation.
    #[must_use]
    pub fn concat(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Concat, other)
    }

    /// `self ?? fallback`
    #[must_use]
    pub fn coalesce(self, fallback: impl Into<Self>) -> Self {
        Self::Coalesce(Box::new(self), Box::new(fallback.into()))
    }

    /// `self.Contains(needle)`
    #[must_use]
    pub fn contains(self, needle: impl Into<Self>) -> Self {
        self.call(StringMethod::Contains, vec![needle.into()])
    }

    /// `self.StartsWith(prefix)`
    #[must_use]
    pub fn starts_with(self, prefix: impl Into<Self>) -> Self {
        self.call(StringMethod::StartsWith, vec![prefix.into()])
    }

    /// `self.EndsWith(suffix)`
    #[must_use]
    pub fn ends_with(self, suffix: impl Into<Self>) -> Self {
        self.call(StringMethod::EndsWith, vec![suffix.into()])
    }

    /// `self.Substring(start)`
    #[must_use]
    pub fn substring(self, start: impl Into<Self>) -> Self {
        self.call(StringMethod::Substring, vec![start.into()])
    }

    /// `self.Substring(start, length)`
    #[must_use]
    pub fn substring_len(self, start: impl Into<Self>, length: impl Into<Self>) -> Self {
        self.call(StringMethod::Substring, vec![start.into(), length.into()])
    }

    /// `self.IndexOf(needle)`
    #[must_use]
    pub fn index_of(self, needle: impl Into<Self>) -> Self {
        self.call(StringMethod::IndexOf, vec![needle.into()])
    }

    /// `self.Replace(from, to)`
    #[must_use]
    pub fn replace(self, from: impl Into<Self>, to: impl Into<Self>) -> Self {
        self.call(StringMethod::Replace, vec![from.into(), to.into()])
    }

    /// `self.ToUpper()`
    #[must_use]
    pub fn to_upper(self) -> Self {
        self.call(StringMethod::ToUpper, Vec::new())
    }

    /// `self.ToLower()`
    #[must_use]
    pub fn to_lower(self) -> Self {
        self.call(StringMethod::ToLower, Vec::new())
    }

    /// `self.Trim()`
    #[must_use]
    pub fn trim(self) -> Self {
        self.call(StringMethod::Trim, Vec::new())
    }

    /// `self.TrimStart()`
    #[must_use]
    pub fn trim_start(self) -> Self {
        self.call(StringMethod::TrimStart, Vec::new())
    }

    /// `self.TrimEnd()`
    #[must_use]
    pub fn trim_end(self) -> Self {
        self.call(StringMethod::TrimEnd, Vec::new())
    }

    /// `self.Length`
    #[must_use]
    pub fn length(self) -> Self {
        self.call(StringMethod::Length, Vec::new())
    }

    /// `values.Contains(self)` over an in-memory collection.
    #[must_use]
    pub fn is_in<V: ToSqlValue>(self, values: impl IntoIterator<Item = V>) -> Self {
        in_list(values, self)
    }

    /// Returns whether the expression is a boolean literal, possibly negated.
    #[must_use]
    pub fn is_boolean_literal(&self) -> bool {
        match self {
            Self::Constant(SqlValue::Bool(_)) => true,
            Self::Not(inner) => inner.is_boolean_literal(),
            _ => false,
        }
    }
}

impl From<Query> for Expr {
    fn from(query: Query) -> Self {
        Self::Query(Box::new(query))
    }
}

impl From<SqlValue> for Expr {
    fn from(value: SqlValue) -> Self {
        Self::Constant(value)
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::Constant(value.to_sql_value())
                }
            }
        )+
    };
}

impl_from_value!(bool, i64, i32, i16, u32, u16, u8, f64, f32, String, &str);

/// A lambda: named parameters and a body.
#[derive(Debug, Clone)]
pub struct Lambda {
    params: Vec<String>,
    body: Expr,
}

impl Lambda {
    /// Creates a one-parameter lambda.
    pub fn new(param: &str, body: impl Into<Expr>) -> Self {
        Self {
            params: vec![param.to_string()],
            body: body.into(),
        }
    }

    /// Creates a lambda with any number of parameters.
    pub fn with_params(params: &[&str], body: impl Into<Expr>) -> Self {
        Self {
            params: params.iter().map(ToString::to_string).collect(),
            body: body.into(),
        }
    }

    /// Returns the parameter names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Expr {
        &self.body
    }

    /// Returns the only parameter.
    ///
    /// # Errors
    ///
    /// Returns a syntax error unless the lambda has exactly one parameter.
    pub fn single_param(&self) -> oxide_canon::Result<&str> {
        match self.params.as_slice() {
            [p] => Ok(p.as_str()),
            other => Err(SqlError::syntax(format!(
                "expected a lambda with one parameter, found {}",
                other.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_chain() {
        let expr = param("x").field("o").field("total");
        let Expr::Member { target, field } = expr else {
            panic!("expected member access");
        };
        assert_eq!(field, "total");
        assert!(matches!(*target, Expr::Member { ref field, .. } if field == "o"));
    }

    #[test]
    fn test_literal_conversions() {
        assert!(matches!(Expr::from(5), Expr::Constant(SqlValue::Int(5))));
        assert!(matches!(Expr::from("a"), Expr::Constant(SqlValue::Text(_))));
    }

    #[test]
    fn test_boolean_literal_detection() {
        assert!(value(true).is_boolean_literal());
        assert!(value(false).not().is_boolean_literal());
        assert!(!member("u", "active").is_boolean_literal());
        assert!(!value(1).is_boolean_literal());
    }

    #[test]
    fn error_lambda_with_two_parameters() {
        let lambda = Lambda::with_params(&["a", "b"], value(true));
        assert!(matches!(lambda.single_param(), Err(SqlError::Syntax(_))));
        assert_eq!(Lambda::new("a", value(1)).single_param().unwrap(), "a");
    }
}
