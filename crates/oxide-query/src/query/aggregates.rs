//! Aggregate functions.

use std::fmt;

/// An aggregate function applied to a query or to a group's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    /// `Count()`: number of rows.
    Count,
    /// `LongCount()`: number of rows as a 64-bit value.
    LongCount,
    /// `Sum(selector)`
    Sum,
    /// `Average(selector)`
    Average,
    /// `Min(selector)`
    Min,
    /// `Max(selector)`
    Max,
}

impl AggregateFn {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Count | Self::LongCount => "COUNT",
            Self::Sum => "SUM",
            Self::Average => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// Returns whether the function counts rows.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count | Self::LongCount)
    }

    /// Renders the call around an already compiled argument. Counting
    /// functions ignore the argument and count every row.
    #[must_use]
    pub fn to_sql(self, argument: Option<&str>) -> String {
        match (self.is_count(), argument) {
            (false, Some(arg)) => format!("{}({arg})", self.sql_name()),
            _ => format!("{}(*)", self.sql_name()),
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_ignores_argument() {
        assert_eq!(AggregateFn::Count.to_sql(None), "COUNT(*)");
        assert_eq!(AggregateFn::LongCount.to_sql(Some("[x].[id]")), "COUNT(*)");
    }

    #[test]
    fn test_sum() {
        assert_eq!(AggregateFn::Sum.to_sql(Some("[x].[amount]")), "SUM([x].[amount])");
    }

    #[test]
    fn test_avg() {
        assert_eq!(AggregateFn::Average.to_sql(Some("[price]")), "AVG([price])");
    }
}
