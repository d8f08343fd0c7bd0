//! Filter predicates
//!
//! A [`Filter<T>`] is a predicate tree over the fields of entity `T`. Leaves
//! compare an expression against a literal (or another expression), test
//! membership in a list, or test for NULL. Branches combine leaves with
//! `AND`, `OR` and `NOT`.
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::{Filter, FilterOperator};
//!
//! struct Widget;
//!
//! let filter: Filter<Widget> = Filter::eq("status", "active")
//!     .and(Filter::gte("rank", 18_i64))
//!     .or(Filter::is_null("retired_at").not());
//!
//! assert_eq!(format!("{}", FilterOperator::GreaterThanOrEqual), ">=");
//! # let _ = filter;
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::field::{Expr, FieldPath};
use super::value::Value;

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching (LIKE)
    Like,
}

impl FilterOperator {
    /// SQL spelling of the operator
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Like => "LIKE",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Untyped predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left <op> right`
    Compare {
        /// Left operand
        left: Expr,
        /// Comparison operator
        operator: FilterOperator,
        /// Right operand
        right: Expr,
    },
    /// `expr IN (values..)`; an empty list matches nothing
    In {
        /// Tested expression
        expr: Expr,
        /// Candidate values
        values: Vec<Value>,
    },
    /// `expr IS NULL`
    IsNull(Expr),
    /// `expr IS NOT NULL`
    IsNotNull(Expr),
    /// All children hold; an empty list matches everything
    And(Vec<Condition>),
    /// Any child holds; an empty list matches nothing
    Or(Vec<Condition>),
    /// Negation
    Not(Box<Condition>),
}

impl Condition {
    /// Every field path the condition references
    pub(crate) fn paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Self::Compare { left, right, .. } => {
                left.paths(out);
                right.paths(out);
            }
            Self::In { expr, .. } | Self::IsNull(expr) | Self::IsNotNull(expr) => expr.paths(out),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_paths(out);
                }
            }
            Self::Not(inner) => inner.collect_paths(out),
        }
    }
}

/// Typed predicate over entity `T`
pub struct Filter<T> {
    condition: Condition,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Filter<T> {
    /// Wrap an untyped condition
    pub fn from_condition(condition: Condition) -> Self {
        Self {
            condition,
            _entity: PhantomData,
        }
    }

    /// The underlying condition
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Consume the filter, yielding its condition
    pub fn into_condition(self) -> Condition {
        self.condition
    }

    fn compare(path: &str, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self::from_condition(Condition::Compare {
            left: Expr::column(path),
            operator,
            right: Expr::Literal(value.into()),
        })
    }

    /// `path = value`
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::Equal, value)
    }

    /// `path != value`
    pub fn ne(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::NotEqual, value)
    }

    /// `path > value`
    pub fn gt(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::GreaterThan, value)
    }

    /// `path >= value`
    pub fn gte(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::GreaterThanOrEqual, value)
    }

    /// `path < value`
    pub fn lt(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::LessThan, value)
    }

    /// `path <= value`
    pub fn lte(path: &str, value: impl Into<Value>) -> Self {
        Self::compare(path, FilterOperator::LessThanOrEqual, value)
    }

    /// `path LIKE pattern`
    pub fn like(path: &str, pattern: impl Into<String>) -> Self {
        Self::compare(path, FilterOperator::Like, Value::Text(pattern.into()))
    }

    /// `path IN (values..)`
    pub fn is_in<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::from_condition(Condition::In {
            expr: Expr::column(path),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// `path IS NULL`
    pub fn is_null(path: &str) -> Self {
        Self::from_condition(Condition::IsNull(Expr::column(path)))
    }

    /// `path IS NOT NULL`
    pub fn is_not_null(path: &str) -> Self {
        Self::from_condition(Condition::IsNotNull(Expr::column(path)))
    }

    /// Compare two arbitrary expressions
    pub fn expr(left: Expr, operator: FilterOperator, right: Expr) -> Self {
        Self::from_condition(Condition::Compare {
            left,
            operator,
            right,
        })
    }

    /// All of the given filters; empty input matches every row
    pub fn all(filters: impl IntoIterator<Item = Filter<T>>) -> Self {
        Self::from_condition(Condition::And(
            filters.into_iter().map(Filter::into_condition).collect(),
        ))
    }

    /// Any of the given filters; empty input matches no row
    pub fn any(filters: impl IntoIterator<Item = Filter<T>>) -> Self {
        Self::from_condition(Condition::Or(
            filters.into_iter().map(Filter::into_condition).collect(),
        ))
    }

    /// Both this and `other`
    #[must_use]
    pub fn and(self, other: Filter<T>) -> Self {
        let condition = match (self.condition, other.condition) {
            (Condition::And(mut left), Condition::And(right)) => {
                left.extend(right);
                Condition::And(left)
            }
            (Condition::And(mut left), right) => {
                left.push(right);
                Condition::And(left)
            }
            (left, right) => Condition::And(vec![left, right]),
        };
        Self::from_condition(condition)
    }

    /// Either this or `other`
    #[must_use]
    pub fn or(self, other: Filter<T>) -> Self {
        let condition = match (self.condition, other.condition) {
            (Condition::Or(mut left), Condition::Or(right)) => {
                left.extend(right);
                Condition::Or(left)
            }
            (Condition::Or(mut left), right) => {
                left.push(right);
                Condition::Or(left)
            }
            (left, right) => Condition::Or(vec![left, right]),
        };
        Self::from_condition(condition)
    }

    /// Negate this filter
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::from_condition(Condition::Not(Box::new(self.condition)))
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self::from_condition(self.condition.clone())
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.condition).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Widget;

    #[test]
    fn test_filter_operator_display() {
        assert_eq!(format!("{}", FilterOperator::Equal), "=");
        assert_eq!(format!("{}", FilterOperator::NotEqual), "!=");
        assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
    }

    #[test]
    fn test_string_and_typed_constructors_agree() {
        let by_path: Filter<Widget> = Filter::eq("name", "bolt");
        let by_field = Widget::NAME.eq("bolt");
        assert_eq!(by_path.condition(), by_field.condition());
    }

    #[test]
    fn test_and_flattens() {
        let filter: Filter<Widget> = Filter::eq("name", "a")
            .and(Filter::gt("rank", 1_i64))
            .and(Filter::is_null("category_id"));
        match filter.condition() {
            Condition::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected AND, got {:?}", other),
        }
    }

    #[test]
    fn test_or_flattens() {
        let filter: Filter<Widget> = Filter::eq("name", "a")
            .or(Filter::eq("name", "b"))
            .or(Filter::eq("name", "c"));
        match filter.condition() {
            Condition::Or(children) => assert_eq!(children.len(), 3),
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn test_not_wraps() {
        let filter: Filter<Widget> = Filter::is_not_null("category_id").not();
        assert!(matches!(filter.condition(), Condition::Not(_)));
    }

    #[test]
    fn test_paths_walks_the_tree() {
        let filter: Filter<Widget> = Filter::eq("category.name", "tools")
            .and(Filter::is_in("id", [1_i64, 2]).not())
            .or(Filter::like("name", "b%"));
        let paths: Vec<String> = filter
            .condition()
            .paths()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(paths, ["category.name", "id", "name"]);
    }
}
