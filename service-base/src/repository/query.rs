//! Query composition
//!
//! [`QueryOptions<T>`] is what callers hand to the retrieval operations: an
//! optional filter, an order list and an include list. [`Query<T>`] is the
//! composed but unexecuted query the `*_query` operations return. Nothing
//! touches the database until the query is passed to
//! [`GenericRepository::fetch`](super::GenericRepository::fetch) or one of
//! its siblings.
//!
//! Modifiers always apply in the same order, whatever order they were set
//! in: filter, then includes, then ordering, then the skip/take window.

use std::fmt;
use std::sync::Arc;

use super::filter::Filter;
use super::include::Include;
use super::order::OrderBy;
use super::page::Page;

/// Optional filter, ordering and eager loads for a retrieval call
///
/// # Example
///
/// ```rust,ignore
/// let options = QueryOptions::new()
///     .filter(ExampleClass::NAVIGATION_CLASS_ID.eq(7))
///     .order_by(ExampleClass::NAME.asc())
///     .include(ExampleClass::navigation_class_include());
/// let rows = repository.get_many(options).await?;
/// ```
pub struct QueryOptions<T> {
    pub(crate) filter: Option<Filter<T>>,
    pub(crate) order: Vec<OrderBy<T>>,
    pub(crate) includes: Vec<Arc<dyn Include<T>>>,
}

impl<T> QueryOptions<T> {
    /// No filter, no ordering, no includes
    pub fn new() -> Self {
        Self {
            filter: None,
            order: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Restrict the rows; repeated calls are AND-combined
    #[must_use]
    pub fn filter(mut self, filter: Filter<T>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Append an ordering entry
    #[must_use]
    pub fn order_by(mut self, order: OrderBy<T>) -> Self {
        self.order.push(order);
        self
    }

    /// Append several ordering entries
    #[must_use]
    pub fn order(mut self, order: impl IntoIterator<Item = OrderBy<T>>) -> Self {
        self.order.extend(order);
        self
    }

    /// Eager load a relation
    #[must_use]
    pub fn include(mut self, include: impl Include<T> + 'static) -> Self {
        self.includes.push(Arc::new(include));
        self
    }

    /// Eager load a shared relation
    #[must_use]
    pub fn include_shared(mut self, include: Arc<dyn Include<T>>) -> Self {
        self.includes.push(include);
        self
    }

    /// The order list
    pub fn order_entries(&self) -> &[OrderBy<T>] {
        &self.order
    }

    /// Whether at least one order entry has a selector
    pub fn has_effective_order(&self) -> bool {
        self.order.iter().any(|order| !order.is_noop())
    }
}

impl<T> Default for QueryOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for QueryOptions<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            order: self.order.clone(),
            includes: self.includes.clone(),
        }
    }
}

impl<T> fmt::Debug for QueryOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOptions")
            .field("filter", &self.filter)
            .field("order", &self.order)
            .field(
                "includes",
                &self.includes.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A composed, lazily executed query over `T`
pub struct Query<T> {
    pub(crate) filter: Option<Filter<T>>,
    pub(crate) includes: Vec<Arc<dyn Include<T>>>,
    pub(crate) order: Vec<OrderBy<T>>,
    pub(crate) skip: Option<u64>,
    pub(crate) take: Option<u64>,
}

impl<T> Query<T> {
    /// Every row, unordered
    pub fn new() -> Self {
        Self {
            filter: None,
            includes: Vec::new(),
            order: Vec::new(),
            skip: None,
            take: None,
        }
    }

    /// Restrict the rows; repeated calls are AND-combined
    #[must_use]
    pub fn filter(mut self, filter: Filter<T>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Eager load a relation
    #[must_use]
    pub fn include(mut self, include: impl Include<T> + 'static) -> Self {
        self.includes.push(Arc::new(include));
        self
    }

    /// Append an ordering entry
    #[must_use]
    pub fn order_by(mut self, order: OrderBy<T>) -> Self {
        self.order.push(order);
        self
    }

    /// Skip the first `count` rows
    #[must_use]
    pub fn skip(mut self, count: u64) -> Self {
        self.skip = Some(count);
        self
    }

    /// Return at most `count` rows
    #[must_use]
    pub fn take(mut self, count: u64) -> Self {
        self.take = Some(count);
        self
    }

    /// Window the query to one page
    #[must_use]
    pub fn page<P>(self, page: &Page<P>) -> Self {
        self.skip(page.skip_count()).take(u64::from(page.page_size()))
    }

    /// The filter, if any
    pub fn filter_ref(&self) -> Option<&Filter<T>> {
        self.filter.as_ref()
    }

    /// Rows skipped before the window
    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    /// Maximum rows returned
    pub fn take_count(&self) -> Option<u64> {
        self.take
    }

    /// The order list
    pub fn order_entries(&self) -> &[OrderBy<T>] {
        &self.order
    }

    /// Names of the relations that will be loaded
    pub fn include_names(&self) -> Vec<&str> {
        self.includes.iter().map(|include| include.name()).collect()
    }
}

impl<T> From<QueryOptions<T>> for Query<T> {
    fn from(options: QueryOptions<T>) -> Self {
        Self {
            filter: options.filter,
            includes: options.includes,
            order: options.order,
            skip: None,
            take: None,
        }
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
            skip: self.skip,
            take: self.take,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter)
            .field("includes", &self.include_names())
            .field("order", &self.order)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .finish()
    }
}
