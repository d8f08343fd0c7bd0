//! Field accessors and expressions
//!
//! A [`FieldPath`] is a dotted chain of segments such as
//! `navigation_class.name`: zero or more navigation names followed by one
//! scalar column. [`Field<T>`] is the typed way to spell a path, usually
//! declared as an associated constant on the entity. [`Expr`] is the small
//! expression language used by filters.
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::FieldPath;
//!
//! let path = FieldPath::parse("navigation_class.name").unwrap();
//! assert_eq!(path.segments(), ["navigation_class", "name"]);
//! assert!(FieldPath::parse("   ").is_none());
//! ```

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use super::filter::{Condition, Filter, FilterOperator};
use super::order::{OrderBy, OrderDirection};
use super::value::Value;

/// A dotted path from an entity to one of its (possibly nested) columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted path; blank input yields `None`
    ///
    /// Segments are trimmed. Empty segments (`"a..b"`) are kept so that
    /// resolution reports them instead of silently skipping them.
    pub fn parse(path: &str) -> Option<Self> {
        if path.trim().is_empty() {
            return None;
        }
        Some(Self(
            path.split('.').map(|segment| segment.trim().to_string()).collect(),
        ))
    }

    /// The path segments, navigation names first
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The terminal segment
    pub fn leaf(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Column type used by [`Expr::Cast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// INTEGER
    Integer,
    /// REAL
    Real,
    /// TEXT
    Text,
}

impl SqlType {
    /// SQL spelling of the type
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// An operand in a filter or sort expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reached through a field path
    Column(FieldPath),
    /// A bound literal
    Literal(Value),
    /// `CAST(expr AS type)`
    Cast(Box<Expr>, SqlType),
    /// `lower(expr)`
    Lower(Box<Expr>),
}

impl Expr {
    /// Column reference from a dotted path; blank paths are rejected later
    pub fn column(path: &str) -> Self {
        Self::Column(FieldPath::parse(path).unwrap_or_else(|| FieldPath(vec![String::new()])))
    }

    /// Literal operand
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Wrap in `CAST(.. AS ty)`
    #[must_use]
    pub fn cast(self, ty: SqlType) -> Self {
        Self::Cast(Box::new(self), ty)
    }

    /// Wrap in `lower(..)`
    #[must_use]
    pub fn lower(self) -> Self {
        Self::Lower(Box::new(self))
    }

    /// The member access under any cast wrappers, if that is all this is
    pub fn member(&self) -> Option<&FieldPath> {
        match self {
            Self::Column(path) => Some(path),
            Self::Cast(inner, _) => inner.member(),
            _ => None,
        }
    }

    pub(crate) fn paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Self::Column(path) => out.push(path),
            Self::Literal(_) => {}
            Self::Cast(inner, _) | Self::Lower(inner) => inner.paths(out),
        }
    }
}

/// Typed accessor for a field of entity `T`
///
/// # Example
///
/// ```rust,ignore
/// impl ExampleClass {
///     pub const NAME: Field<ExampleClass> = Field::new("name");
///     pub const NAVIGATION_CLASS: Field<ExampleClass> = Field::new("navigation_class");
/// }
///
/// let by_parent_name = ExampleClass::NAVIGATION_CLASS.then(NavigationClass::NAME);
/// assert_eq!(by_parent_name.path_str(), "navigation_class.name");
/// ```
pub struct Field<T> {
    path: Cow<'static, str>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    /// Declare a field by its dotted path
    pub const fn new(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            _entity: PhantomData,
        }
    }

    /// Continue the path through a navigation into the target entity
    pub fn then<U>(&self, next: Field<U>) -> Field<T> {
        Field {
            path: Cow::Owned(format!("{}.{}", self.path, next.path)),
            _entity: PhantomData,
        }
    }

    /// The dotted path
    pub fn path_str(&self) -> &str {
        &self.path
    }

    /// The path as a column expression
    pub fn expr(&self) -> Expr {
        Expr::column(&self.path)
    }

    fn compare(&self, operator: FilterOperator, value: impl Into<Value>) -> Filter<T> {
        Filter::from_condition(Condition::Compare {
            left: self.expr(),
            operator,
            right: Expr::Literal(value.into()),
        })
    }

    /// `field = value`
    pub fn eq(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::Equal, value)
    }

    /// `field != value`
    pub fn ne(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::NotEqual, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::GreaterThan, value)
    }

    /// `field >= value`
    pub fn gte(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::GreaterThanOrEqual, value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::LessThan, value)
    }

    /// `field <= value`
    pub fn lte(&self, value: impl Into<Value>) -> Filter<T> {
        self.compare(FilterOperator::LessThanOrEqual, value)
    }

    /// `field LIKE pattern`
    pub fn like(&self, pattern: impl Into<String>) -> Filter<T> {
        self.compare(FilterOperator::Like, Value::Text(pattern.into()))
    }

    /// `field IN (values..)`
    pub fn is_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Filter<T> {
        Filter::from_condition(Condition::In {
            expr: self.expr(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// `field IS NULL`
    pub fn is_null(&self) -> Filter<T> {
        Filter::from_condition(Condition::IsNull(self.expr()))
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(&self) -> Filter<T> {
        Filter::from_condition(Condition::IsNotNull(self.expr()))
    }

    /// Ascending order on this field
    pub fn asc(&self) -> OrderBy<T> {
        OrderBy::field(self.clone(), OrderDirection::Ascending)
    }

    /// Descending order on this field
    pub fn desc(&self) -> OrderBy<T> {
        OrderBy::field(self.clone(), OrderDirection::Descending)
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.path).finish()
    }
}
