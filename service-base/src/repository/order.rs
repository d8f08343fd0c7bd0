//! Ordering
//!
//! An [`OrderBy<T>`] pairs a sort key with a direction. The sort key is a
//! [`FieldPath`] or nothing at all: a blank path produces a no-op entry that
//! the repository skips when it renders `ORDER BY`.
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::{OrderBy, OrderDirection};
//!
//! struct Widget;
//!
//! let by_name: OrderBy<Widget> = OrderBy::path("name");
//! assert_eq!(by_name.direction(), OrderDirection::Ascending);
//!
//! let noop: OrderBy<Widget> = OrderBy::path("  ");
//! assert!(noop.is_noop());
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::field::{Expr, Field, FieldPath};

/// Direction for ordering results
///
/// # Example
///
/// ```rust
/// use service_base::repository::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
/// assert_eq!(format!("{}", OrderDirection::Descending), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    /// SQL keyword
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One ordering entry for entity `T`
pub struct OrderBy<T> {
    selector: Option<FieldPath>,
    direction: OrderDirection,
    _entity: PhantomData<fn() -> T>,
}

impl<T> OrderBy<T> {
    fn with_selector(selector: Option<FieldPath>, direction: OrderDirection) -> Self {
        Self {
            selector,
            direction,
            _entity: PhantomData,
        }
    }

    /// Ascending order on a dotted field path
    ///
    /// A blank path yields a no-op entry. Unknown segments are reported when
    /// the query runs.
    pub fn path(path: &str) -> Self {
        Self::path_with(path, OrderDirection::Ascending)
    }

    /// Order on a dotted field path in the given direction
    pub fn path_with(path: &str, direction: OrderDirection) -> Self {
        Self::with_selector(FieldPath::parse(path), direction)
    }

    /// Order on a typed field
    pub fn field(field: Field<T>, direction: OrderDirection) -> Self {
        Self::path_with(field.path_str(), direction)
    }

    /// Order on an expression that reduces to a member access
    ///
    /// Cast wrappers are stripped. Anything else, such as a literal or
    /// `lower(..)`, is a contract violation.
    pub fn try_expr(expr: &Expr, direction: OrderDirection) -> RepositoryResult<Self> {
        let path = expr.member().ok_or_else(|| {
            RepositoryError::contract_violation(
                RepositoryOperation::GetMany,
                format!(
                    "sort expression must be a member access, got {:?}",
                    expr
                ),
            )
        })?;
        Ok(Self::with_selector(Some(path.clone()), direction))
    }

    /// Same selector, descending
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.direction = OrderDirection::Descending;
        self
    }

    /// Sort direction
    pub fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// Sort key, `None` for a no-op entry
    pub fn selector(&self) -> Option<&FieldPath> {
        self.selector.as_ref()
    }

    /// Whether this entry contributes nothing to `ORDER BY`
    pub fn is_noop(&self) -> bool {
        self.selector.is_none()
    }
}

impl<T> Clone for OrderBy<T> {
    fn clone(&self) -> Self {
        Self::with_selector(self.selector.clone(), self.direction)
    }
}

impl<T> fmt::Debug for OrderBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy")
            .field("selector", &self.selector)
            .field("direction", &self.direction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::field::SqlType;
    use crate::repository::fixtures::{Category, Widget};

    #[test]
    fn test_default_direction_is_ascending() {
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
        let order: OrderBy<Widget> = OrderBy::path("name");
        assert_eq!(order.direction(), OrderDirection::Ascending);
        assert_eq!(order.descending().direction(), OrderDirection::Descending);
    }

    #[test]
    fn test_blank_path_is_noop() {
        assert!(OrderBy::<Widget>::path("").is_noop());
        assert!(OrderBy::<Widget>::path("   ").is_noop());
        assert!(!OrderBy::<Widget>::path("name").is_noop());
    }

    #[test]
    fn test_nested_path_keeps_segments() {
        let order: OrderBy<Widget> =
            OrderBy::path_with("category.name", OrderDirection::Descending);
        let selector = order.selector().unwrap();
        assert_eq!(selector.segments(), ["category", "name"]);
    }

    #[test]
    fn test_typed_field_order() {
        let order = Widget::CATEGORY.then(Category::NAME).desc();
        assert_eq!(order.selector().unwrap().to_string(), "category.name");
        assert_eq!(order.direction(), OrderDirection::Descending);
    }

    #[test]
    fn test_try_expr_strips_casts() {
        let expr = Widget::RANK.expr().cast(SqlType::Real);
        let order = OrderBy::<Widget>::try_expr(&expr, OrderDirection::Ascending).unwrap();
        assert_eq!(order.selector().unwrap().leaf(), "rank");
    }

    #[test]
    fn test_try_expr_rejects_non_member() {
        let lowered = Widget::NAME.expr().lower();
        let err = OrderBy::<Widget>::try_expr(&lowered, OrderDirection::Ascending).unwrap_err();
        assert!(err.is_contract_violation());

        let literal = Expr::literal(3_i64).cast(SqlType::Text);
        assert!(OrderBy::<Widget>::try_expr(&literal, OrderDirection::Ascending).is_err());
    }
}
