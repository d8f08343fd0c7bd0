//! # service-base
//!
//! A generic data-access layer over sqlx. One repository type serves every
//! entity: count, create, update, delete, lookups by composite key, and
//! filtered, ordered, paged and eager-loaded retrieval.
//!
//! ## Features
//!
//! - **Generic repository**: [`repository::GenericRepository`] works for any
//!   [`repository::Entity`]
//! - **Overridable services**: [`repository::EntityService`] forwards every
//!   operation to the repository by default
//! - **Query composition**: filters, field paths through navigations,
//!   stable ordering, paging and batched includes
//! - **Typed errors**: contract violations, misses and persistence failures
//!   are distinct [`repository::RepositoryErrorKind`]s
//! - **Configuration**: layered Figment config (defaults, files, environment)
//! - **Logging**: `tracing` with pretty or JSON output
//!
//! ## Example
//!
//! ```rust,no_run
//! use service_base::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     // Connect to the database
//!     let context = Context::connect(&config.database).await?;
//!     tracing::info!(?context, "ready");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod repository;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, LogFormat, ServiceConfig};
    pub use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        BelongsTo, Context, Entity, EntityService, Field, Filter, GenericRepository, HasMany,
        Include, Join, Key, OrderBy, OrderDirection, Page, Query, QueryOptions, RepositoryError,
        RepositoryErrorKind, RepositoryResult, Schema, Value,
    };
}
