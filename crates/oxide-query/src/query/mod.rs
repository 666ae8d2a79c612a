//! Query trees.
//!
//! A [`Query`] is a chain of method-call nodes ending in a table source,
//! built fluently the way LINQ queries are:
//!
//! ```rust
//! use oxide_query::query::{member, Lambda, Query};
//! use oxide_query::schema::{Entity, TableInfo};
//!
//! struct User;
//!
//! impl Entity for User {
//!     fn table_info() -> TableInfo {
//!         TableInfo::builder("users").key("id", "id").field("age").build()
//!     }
//! }
//!
//! let query = Query::table::<User>()
//!     .filter(Lambda::new("u", member("u", "age").ge(18)))
//!     .order_by(Lambda::new("u", member("u", "id")))
//!     .take(10);
//! assert!(matches!(query, Query::Take { count: 10, .. }));
//! ```

mod aggregates;
mod expr;

pub use aggregates::AggregateFn;
pub use expr::{
    condition, group_aggregate, group_count, group_key, in_list, is_null_or_empty, member, object,
    param, value, variable, BinaryOp, Expr, Lambda, StringMethod, GROUP_KEY,
};

use crate::schema::{Entity, EntityType};

/// Join flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT JOIN`
    Left,
}

impl JoinKind {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// Set operators combining two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// `Union`: distinct rows of both sides.
    Union,
    /// `Concat`: all rows of both sides.
    Concat,
    /// `Except`: rows of the left side absent from the right side.
    Except,
    /// `Intersect`: rows present on both sides.
    Intersect,
}

impl SetOperator {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Concat => "UNION ALL",
            Self::Except => "EXCEPT",
            Self::Intersect => "INTERSECT",
        }
    }
}

/// Single-element operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `First`
    First,
    /// `Last`
    Last,
    /// `Single`
    Single,
}

/// A node of a query tree.
#[derive(Debug, Clone)]
pub enum Query {
    /// All rows of an entity's table.
    Table(EntityType),
    /// `Where(predicate)`
    Where {
        /// Input query.
        source: Box<Query>,
        /// Row filter.
        predicate: Lambda,
    },
    /// `Select(selector)`
    Select {
        /// Input query.
        source: Box<Query>,
        /// Projection.
        selector: Lambda,
    },
    /// `Distinct()`
    Distinct {
        /// Input query.
        source: Box<Query>,
    },
    /// `OrderBy`, `OrderByDescending`, `ThenBy` and `ThenByDescending`.
    OrderBy {
        /// Input query.
        source: Box<Query>,
        /// Sort key.
        key: Lambda,
        /// Sort descending.
        descending: bool,
        /// Add to the existing ordering instead of replacing it.
        then_by: bool,
    },
    /// `Join(inner, outer_key, inner_key, result)`
    Join {
        /// Outer query.
        source: Box<Query>,
        /// Join flavor.
        kind: JoinKind,
        /// Inner query.
        inner: Box<Query>,
        /// Key of the outer row.
        outer_key: Lambda,
        /// Key of the inner row.
        inner_key: Lambda,
        /// Two-parameter result selector.
        result: Lambda,
    },
    /// `GroupBy(key)`
    GroupBy {
        /// Input query.
        source: Box<Query>,
        /// Grouping key.
        key: Lambda,
    },
    /// `Take(count)`
    Take {
        /// Input query.
        source: Box<Query>,
        /// Row count.
        count: u64,
    },
    /// `Skip(count)`
    Skip {
        /// Input query.
        source: Box<Query>,
        /// Row count.
        count: u64,
    },
    /// `TakeLast(count)`
    TakeLast {
        /// Input query.
        source: Box<Query>,
        /// Row count.
        count: u64,
    },
    /// `SkipLast(count)`
    SkipLast {
        /// Input query.
        source: Box<Query>,
        /// Row count.
        count: u64,
    },
    /// `Reverse()`
    Reverse {
        /// Input query.
        source: Box<Query>,
    },
    /// `ElementAt(index)` and `ElementAtOrDefault(index)`.
    ElementAt {
        /// Input query.
        source: Box<Query>,
        /// 0-based row index.
        index: u64,
        /// Tolerate a missing row.
        or_default: bool,
    },
    /// `First`, `Last`, `Single` and their `OrDefault` forms.
    Element {
        /// Input query.
        source: Box<Query>,
        /// Which element.
        kind: ElementKind,
        /// Tolerate a missing row.
        or_default: bool,
        /// Optional filter.
        predicate: Option<Lambda>,
    },
    /// `Count`, `LongCount`, `Sum`, `Average`, `Min` and `Max`.
    Aggregate {
        /// Input query.
        source: Box<Query>,
        /// The function.
        func: AggregateFn,
        /// Value selector for functions that take one.
        selector: Option<Lambda>,
    },
    /// `Any()` and `Any(predicate)`.
    Any {
        /// Input query.
        source: Box<Query>,
        /// Optional filter.
        predicate: Option<Lambda>,
    },
    /// `All(predicate)`
    All {
        /// Input query.
        source: Box<Query>,
        /// Condition every row must meet.
        predicate: Lambda,
    },
    /// `Contains(item)` over a query of scalar values.
    Contains {
        /// Input query.
        source: Box<Query>,
        /// The value looked up.
        item: Box<Expr>,
    },
    /// `Union`, `Concat`, `Except` and `Intersect`.
    SetOp {
        /// Left input.
        left: Box<Query>,
        /// The operator.
        op: SetOperator,
        /// Right input.
        right: Box<Query>,
    },
    /// Inserts one row.
    Insert {
        /// Target entity.
        entity: EntityType,
        /// Object initializer naming the assigned fields.
        values: Expr,
    },
    /// Updates the rows of `source`.
    Update {
        /// Target rows: a table with filters and joins.
        source: Box<Query>,
        /// Object initializer over the row, naming the assigned fields.
        assignments: Lambda,
    },
    /// Deletes the rows of `source`.
    Delete {
        /// Target rows: a table with filters and joins.
        source: Box<Query>,
    },
}

impl Query {
    /// Starts a query over all rows of `T`.
    #[must_use]
    pub fn table<T: Entity>() -> Self {
        Self::Table(EntityType::of::<T>())
    }

    /// Inserts one row of `T`.
    pub fn insert<T: Entity>(values: impl Into<Expr>) -> Self {
        Self::Insert {
            entity: EntityType::of::<T>(),
            values: values.into(),
        }
    }

    /// Returns the input query of an operator node.
    #[must_use]
    pub fn source(&self) -> Option<&Self> {
        match self {
            Self::Table(_) | Self::SetOp { .. } | Self::Insert { .. } => None,
            Self::Where { source, .. }
            | Self::Select { source, .. }
            | Self::Distinct { source }
            | Self::OrderBy { source, .. }
            | Self::Join { source, .. }
            | Self::GroupBy { source, .. }
            | Self::Take { source, .. }
            | Self::Skip { source, .. }
            | Self::TakeLast { source, .. }
            | Self::SkipLast { source, .. }
            | Self::Reverse { source }
            | Self::ElementAt { source, .. }
            | Self::Element { source, .. }
            | Self::Aggregate { source, .. }
            | Self::Any { source, .. }
            | Self::All { source, .. }
            | Self::Contains { source, .. }
            | Self::Update { source, .. }
            | Self::Delete { source } => Some(source),
        }
    }

    /// Returns the operator name, for diagnostics.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Table(_) => "Table",
            Self::Where { .. } => "Where",
            Self::Select { .. } => "Select",
            Self::Distinct { .. } => "Distinct",
            Self::OrderBy { then_by: false, .. } => "OrderBy",
            Self::OrderBy { then_by: true, .. } => "ThenBy",
            Self::Join { .. } => "Join",
            Self::GroupBy { .. } => "GroupBy",
            Self::Take { .. } => "Take",
            Self::Skip { .. } => "Skip",
            Self::TakeLast { .. } => "TakeLast",
            Self::SkipLast { .. } => "SkipLast",
            Self::Reverse { .. } => "Reverse",
            Self::ElementAt { .. } => "ElementAt",
            Self::Element {
                kind: ElementKind::First,
                ..
            } => "First",
            Self::Element {
                kind: ElementKind::Last,
                ..
            } => "Last",
            Self::Element {
                kind: ElementKind::Single,
                ..
            } => "Single",
            Self::Aggregate { .. } => "Aggregate",
            Self::Any { .. } => "Any",
            Self::All { .. } => "All",
            Self::Contains { .. } => "Contains",
            Self::SetOp { .. } => "SetOp",
            Self::Insert { .. } => "Insert",
            Self::Update { .. } => "Update",
            Self::Delete { .. } => "Delete",
        }
    }

    /// `Where(predicate)`
    #[must_use]
    pub fn filter(self, predicate: Lambda) -> Self {
        Self::Where {
            source: Box::new(self),
            predicate,
        }
    }

    /// `Select(selector)`
    #[must_use]
    pub fn select(self, selector: Lambda) -> Self {
        Self::Select {
            source: Box::new(self),
            selector,
        }
    }

    /// `Distinct()`
    #[must_use]
    pub fn distinct(self) -> Self {
        Self::Distinct {
            source: Box::new(self),
        }
    }

    fn ordered(self, key: Lambda, descending: bool, then_by: bool) -> Self {
        Self::OrderBy {
            source: Box::new(self),
            key,
            descending,
            then_by,
        }
    }

    /// `OrderBy(key)`
    #[must_use]
    pub fn order_by(self, key: Lambda) -> Self {
        self.ordered(key, false, false)
    }

    /// `OrderByDescending(key)`
    #[must_use]
    pub fn order_by_desc(self, key: Lambda) -> Self {
        self.ordered(key, true, false)
    }

    /// `ThenBy(key)`
    #[must_use]
    pub fn then_by(self, key: Lambda) -> Self {
        self.ordered(key, false, true)
    }

    /// `ThenByDescending(key)`
    #[must_use]
    pub fn then_by_desc(self, key: Lambda) -> Self {
        self.ordered(key, true, true)
    }

    /// Inner join on `outer_key == inner_key`.
    #[must_use]
    pub fn join(self, inner: Self, outer_key: Lambda, inner_key: Lambda, result: Lambda) -> Self {
        Self::Join {
            source: Box::new(self),
            kind: JoinKind::Inner,
            inner: Box::new(inner),
            outer_key,
            inner_key,
            result,
        }
    }

    /// Left join on `outer_key == inner_key`.
    #[must_use]
    pub fn left_join(
        self,
        inner: Self,
        outer_key: Lambda,
        inner_key: Lambda,
        result: Lambda,
    ) -> Self {
        Self::Join {
            source: Box::new(self),
            kind: JoinKind::Left,
            inner: Box::new(inner),
            outer_key,
            inner_key,
            result,
        }
    }

    /// `GroupBy(key)`
    #[must_use]
    pub fn group_by(self, key: Lambda) -> Self {
        Self::GroupBy {
            source: Box::new(self),
            key,
        }
    }

    /// `Take(count)`
    #[must_use]
    pub fn take(self, count: u64) -> Self {
        Self::Take {
            source: Box::new(self),
            count,
        }
    }

    /// `Skip(count)`
    #[must_use]
    pub fn skip(self, count: u64) -> Self {
        Self::Skip {
            source: Box::new(self),
            count,
        }
    }

    /// `TakeLast(count)`
    #[must_use]
    pub fn take_last(self, count: u64) -> Self {
        Self::TakeLast {
            source: Box::new(self),
            count,
        }
    }

    /// `SkipLast(count)`
    #[must_use]
    pub fn skip_last(self, count: u64) -> Self {
        Self::SkipLast {
            source: Box::new(self),
            count,
        }
    }

    /// `Reverse()`
    #[must_use]
    pub fn reverse(self) -> Self {
        Self::Reverse {
            source: Box::new(self),
        }
    }

    /// `ElementAt(index)`
    #[must_use]
    pub fn element_at(self, index: u64) -> Self {
        Self::ElementAt {
            source: Box::new(self),
            index,
            or_default: false,
        }
    }

    /// `ElementAtOrDefault(index)`
    #[must_use]
    pub fn element_at_or_default(self, index: u64) -> Self {
        Self::ElementAt {
            source: Box::new(self),
            index,
            or_default: true,
        }
    }

    fn element(self, kind: ElementKind, or_default: bool, predicate: Option<Lambda>) -> Self {
        Self::Element {
            source: Box::new(self),
            kind,
            or_default,
            predicate,
        }
    }

    /// `First()`
    #[must_use]
    pub fn first(self) -> Self {
        self.element(ElementKind::First, false, None)
    }

    /// `First(predicate)`
    #[must_use]
    pub fn first_where(self, predicate: Lambda) -> Self {
        self.element(ElementKind::First, false, Some(predicate))
    }

    /// `FirstOrDefault()`
    #[must_use]
    pub fn first_or_default(self) -> Self {
        self.element(ElementKind::First, true, None)
    }

    /// `Last()`
    #[must_use]
    pub fn last(self) -> Self {
        self.element(ElementKind::Last, false, None)
    }

    /// `LastOrDefault()`
    #[must_use]
    pub fn last_or_default(self) -> Self {
        self.element(ElementKind::Last, true, None)
    }

    /// `Single()`
    #[must_use]
    pub fn single(self) -> Self {
        self.element(ElementKind::Single, false, None)
    }

    /// `Single(predicate)`
    #[must_use]
    pub fn single_where(self, predicate: Lambda) -> Self {
        self.element(ElementKind::Single, false, Some(predicate))
    }

    /// `SingleOrDefault()`
    #[must_use]
    pub fn single_or_default(self) -> Self {
        self.element(ElementKind::Single, true, None)
    }

    fn aggregate(self, func: AggregateFn, selector: Option<Lambda>) -> Self {
        Self::Aggregate {
            source: Box::new(self),
            func,
            selector,
        }
    }

    /// `Count()`
    #[must_use]
    pub fn count(self) -> Self {
        self.aggregate(AggregateFn::Count, None)
    }

    /// `Count(predicate)`
    #[must_use]
    pub fn count_where(self, predicate: Lambda) -> Self {
        self.filter(predicate).count()
    }

    /// `LongCount()`
    #[must_use]
    pub fn long_count(self) -> Self {
        self.aggregate(AggregateFn::LongCount, None)
    }

    /// `Sum(selector)`
    #[must_use]
    pub fn sum(self, selector: Lambda) -> Self {
        self.aggregate(AggregateFn::Sum, Some(selector))
    }

    /// `Average(selector)`
    #[must_use]
    pub fn average(self, selector: Lambda) -> Self {
        self.aggregate(AggregateFn::Average, Some(selector))
    }

    /// `Min(selector)`
    #[must_use]
    pub fn min(self, selector: Lambda) -> Self {
        self.aggregate(AggregateFn::Min, Some(selector))
    }

    /// `Max(selector)`
    #[must_use]
    pub fn max(self, selector: Lambda) -> Self {
        self.aggregate(AggregateFn::Max, Some(selector))
    }

    /// `Any()`
    #[must_use]
    pub fn any(self) -> Self {
        Self::Any {
            source: Box::new(self),
            predicate: None,
        }
    }

    /// `Any(predicate)`
    #[must_use]
    pub fn any_where(self, predicate: Lambda) -> Self {
        Self::Any {
            source: Box::new(self),
            predicate: Some(predicate),
        }
    }

    /// `All(predicate)`
    #[must_use]
    pub fn all(self, predicate: Lambda) -> Self {
        Self::All {
            source: Box::new(self),
            predicate,
        }
    }

    /// `Contains(item)`
    #[must_use]
    pub fn contains(self, item: impl Into<Expr>) -> Self {
        Self::Contains {
            source: Box::new(self),
            item: Box::new(item.into()),
        }
    }

    fn set_op(self, op: SetOperator, other: Self) -> Self {
        Self::SetOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// `Union(other)`
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.set_op(SetOperator::Union, other)
    }

    /// `Concat(other)`
    #[must_use]
    pub fn concat(self, other: Self) -> Self {
        self.set_op(SetOperator::Concat, other)
    }

    /// `Except(other)`
    #[must_use]
    pub fn except(self, other: Self) -> Self {
        self.set_op(SetOperator::Except, other)
    }

    /// `Intersect(other)`
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        self.set_op(SetOperator::Intersect, other)
    }

    /// Updates every row of this query.
    #[must_use]
    pub fn update(self, assignments: Lambda) -> Self {
        Self::Update {
            source: Box::new(self),
            assignments,
        }
    }

    /// Deletes every row of this query.
    #[must_use]
    pub fn delete(self) -> Self {
        Self::Delete {
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableInfo;

    struct Item;

    impl Entity for Item {
        fn table_info() -> TableInfo {
            TableInfo::builder("items").field("id").build()
        }
    }

    #[test]
    fn test_chain_links_sources() {
        let query = Query::table::<Item>()
            .filter(Lambda::new("i", member("i", "id").gt(1)))
            .take(3);
        assert_eq!(query.operator(), "Take");
        let source = query.source().unwrap();
        assert_eq!(source.operator(), "Where");
        assert_eq!(source.source().unwrap().operator(), "Table");
        assert!(source.source().unwrap().source().is_none());
    }

    #[test]
    fn test_count_where_filters_first() {
        let query = Query::table::<Item>().count_where(Lambda::new("i", member("i", "id").eq(1)));
        assert!(matches!(
            query,
            Query::Aggregate {
                func: AggregateFn::Count,
                ..
            }
        ));
        assert_eq!(query.source().unwrap().operator(), "Where");
    }

    #[test]
    fn test_set_operator_keywords() {
        assert_eq!(SetOperator::Concat.as_sql(), "UNION ALL");
        assert_eq!(SetOperator::Except.as_sql(), "EXCEPT");
    }
}
