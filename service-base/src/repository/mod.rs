//! Generic repository over sqlx
//!
//! This module provides a generic data-access layer: one
//! [`GenericRepository<T>`] works for every [`Entity`], and
//! [`EntityService<T>`] wraps it in an overridable service surface.
//!
//! # Features
//!
//! - **CRUD**: count, create, create-many, update, delete and clear, each in
//!   its own transaction
//! - **Lookups**: by (composite) key, first match, all matches, or a page
//! - **Filtering**: [`Filter`] predicates over field paths, including paths
//!   through to-one navigations
//! - **Ordering**: [`OrderBy`] entries with stable key tie-breakers
//! - **Paging**: [`Page`] requests that report the filtered total
//! - **Eager loading**: [`BelongsTo`] and [`HasMany`] includes, one batched
//!   query each
//! - **Lazy queries**: every lookup has a `*_query` form returning [`Query`]
//!
//! Retrieval always composes in the same order: filter, includes, ordering,
//! then the skip/take window.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_base::repository::{EntityService, Page, QueryOptions};
//!
//! let page = service
//!     .get_many_paged(
//!         &Page::new(1, 20),
//!         QueryOptions::new()
//!             .filter(ExampleClass::NAVIGATION_CLASS_ID.eq(navigation_id))
//!             .order_by(ExampleClass::NAME.asc())
//!             .include(ExampleClass::navigation_class_include()),
//!     )
//!     .await?;
//! ```

mod context;
mod entity;
mod error;
mod field;
mod filter;
mod generic;
mod include;
mod order;
mod page;
mod query;
mod resolve;
mod service;
mod sql;
mod value;

#[cfg(test)]
pub(crate) mod fixtures;

pub use context::Context;
pub use entity::{DeclaredKeys, Entity, Join, KeyMetadata, Schema};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation, RepositoryResult};
pub use field::{Expr, Field, FieldPath, SqlType};
pub use filter::{Condition, Filter, FilterOperator};
pub use generic::GenericRepository;
pub use include::{BelongsTo, HasMany, Include, INCLUDE_CHUNK_SIZE};
pub use order::{OrderBy, OrderDirection};
pub use page::{Page, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
pub use query::{Query, QueryOptions};
pub use resolve::{FieldResolver, ResolvedField};
pub use service::EntityService;
pub use value::{Key, Value};
