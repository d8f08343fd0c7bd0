//! The generic repository
//!
//! [`GenericRepository<T>`] implements count, create, update, delete and
//! retrieval for any [`Entity`]. Mutations run in their own transaction and
//! commit once. Retrieval composes filter, includes, ordering and the
//! skip/take window into one `SELECT`, then runs each include as a batched
//! follow-up query.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_base::repository::{Context, GenericRepository, Page, QueryOptions};
//!
//! let repository: GenericRepository<ExampleClass> = GenericRepository::new(context);
//!
//! let created = repository.create(&ExampleClass::new(7, "first")).await?;
//! let page = repository
//!     .get_many_paged(
//!         &Page::new(2, 15),
//!         QueryOptions::new()
//!             .filter(ExampleClass::NAVIGATION_CLASS_ID.eq(7))
//!             .order_by(ExampleClass::NAME.asc()),
//!     )
//!     .await?;
//! println!("{} of {} rows", page.rows().len(), page.total_rows());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::context::Context;
use super::entity::{Entity, Schema};
use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::field::FieldPath;
use super::filter::Filter;
use super::include::Include;
use super::order::OrderDirection;
use super::page::Page;
use super::query::{Query, QueryOptions};
use super::resolve::FieldResolver;
use super::sql;
use super::value::{Key, Value};

/// CRUD and query operations for entity `T`
pub struct GenericRepository<T> {
    context: Context,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> GenericRepository<T> {
    /// Create a repository over a persistence context
    pub fn new(context: Context) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// The persistence context
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Static table description of `T`
    pub fn schema(&self) -> &'static Schema {
        T::schema()
    }

    /// Key columns of `T` in declared order
    pub fn key_names(&self) -> Vec<&'static str> {
        self.context.key_names(T::schema())
    }

    /// Classify a store error, logging persistence failures
    fn fail(&self, operation: RepositoryOperation, err: sqlx::Error) -> RepositoryError {
        let error = RepositoryError::from(err)
            .with_operation(operation)
            .with_entity_type(T::schema().name);
        if error.is_persistence_failure() {
            tracing::warn!(
                entity = T::schema().name,
                operation = %operation,
                kind = %error.kind,
                error = %error.message,
                "Repository operation failed"
            );
        }
        error
    }

    /// Check a key against the declared key arity
    fn checked_key(
        &self,
        operation: RepositoryOperation,
        key: Key,
    ) -> RepositoryResult<(Vec<&'static str>, Key)> {
        let names = self.key_names();
        if key.len() != names.len() {
            return Err(RepositoryError::contract_violation(
                operation,
                format!(
                    "expected {} key value(s) ({}), got {}",
                    names.len(),
                    names.join(", "),
                    key.len()
                ),
            )
            .with_entity_type(T::schema().name));
        }
        Ok((names, key))
    }

    /// Number of rows matching `filter`, or every row
    pub async fn count(&self, filter: Option<&Filter<T>>) -> RepositoryResult<u64> {
        let schema = T::schema();
        let mut builder = sql::count(schema, filter.map(Filter::condition))
            .map_err(|e| e.with_operation(RepositoryOperation::Count))?;

        tracing::debug!(entity = schema.name, table = schema.table, "Counting rows");
        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(self.context.pool())
            .await
            .map_err(|e| self.fail(RepositoryOperation::Count, e))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    /// Insert `entity` and return the stored row
    ///
    /// A store-generated key left at zero is assigned by the database and
    /// appears in the returned row.
    pub async fn create(&self, entity: &T) -> RepositoryResult<T> {
        let op = RepositoryOperation::Create;
        let schema = T::schema();
        let mut tx = self
            .context
            .pool()
            .begin()
            .await
            .map_err(|e| self.fail(op, e))?;

        let mut builder = sql::insert(schema, entity.values());
        let stored = builder
            .build_query_as::<T>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| self.fail(op, e))?;

        tx.commit().await.map_err(|e| self.fail(op, e))?;
        tracing::debug!(entity = schema.name, table = schema.table, "Created row");
        Ok(stored)
    }

    /// Insert every entity in one transaction
    ///
    /// Either all rows are stored or none are. An empty slice succeeds
    /// without touching the database.
    pub async fn create_many(&self, entities: &[T]) -> RepositoryResult<Vec<T>> {
        let op = RepositoryOperation::CreateMany;
        let schema = T::schema();
        if entities.is_empty() {
            tracing::debug!(entity = schema.name, "Nothing to create");
            return Ok(Vec::new());
        }

        let mut tx = self
            .context
            .pool()
            .begin()
            .await
            .map_err(|e| self.fail(op, e))?;

        let mut stored = Vec::with_capacity(entities.len());
        for entity in entities {
            let mut builder = sql::insert(schema, entity.values());
            let row = builder
                .build_query_as::<T>()
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| self.fail(op, e))?;
            stored.push(row);
        }

        tx.commit().await.map_err(|e| self.fail(op, e))?;
        tracing::debug!(
            entity = schema.name,
            table = schema.table,
            count = stored.len(),
            "Created rows"
        );
        Ok(stored)
    }

    /// Overwrite the non-key columns of an existing row
    ///
    /// The key is read from `entity` using the declared key columns. A row
    /// that does not exist is reported as `NotFound`.
    pub async fn update(&self, entity: &T) -> RepositoryResult<T> {
        let op = RepositoryOperation::Update;
        let schema = T::schema();
        let names = self.key_names();
        let key = entity.key_for(&names).map_err(|e| e.with_operation(op))?;
        let (names, key) = self.checked_key(op, key)?;

        let mut tx = self
            .context
            .pool()
            .begin()
            .await
            .map_err(|e| self.fail(op, e))?;

        let mut builder = sql::update(schema, &names, &key, entity.values());
        let stored = builder
            .build_query_as::<T>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| self.fail(op, e))?;

        let Some(stored) = stored else {
            return Err(RepositoryError::not_found(schema.name, key.to_string()).with_operation(op));
        };

        tx.commit().await.map_err(|e| self.fail(op, e))?;
        tracing::debug!(entity = schema.name, key = %key, "Updated row");
        Ok(stored)
    }

    /// Delete the row with the given key
    ///
    /// Key values must be in declared key order. A missing row is reported
    /// as `NotFound`.
    pub async fn delete(&self, key: impl Into<Key> + Send) -> RepositoryResult<()> {
        let op = RepositoryOperation::Delete;
        let schema = T::schema();
        let (names, key) = self.checked_key(op, key.into())?;

        let mut tx = self
            .context
            .pool()
            .begin()
            .await
            .map_err(|e| self.fail(op, e))?;

        let mut builder = sql::delete(schema, &names, &key);
        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| self.fail(op, e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(schema.name, key.to_string()).with_operation(op));
        }

        tx.commit().await.map_err(|e| self.fail(op, e))?;
        tracing::debug!(entity = schema.name, key = %key, "Deleted row");
        Ok(())
    }

    /// Delete every row of `T`, returning how many were removed
    pub async fn clear_entity(&self) -> RepositoryResult<u64> {
        let op = RepositoryOperation::Clear;
        let schema = T::schema();
        let mut tx = self
            .context
            .pool()
            .begin()
            .await
            .map_err(|e| self.fail(op, e))?;

        let mut builder = sql::clear(schema);
        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| self.fail(op, e))?;

        tx.commit().await.map_err(|e| self.fail(op, e))?;
        tracing::debug!(
            entity = schema.name,
            removed = result.rows_affected(),
            "Cleared table"
        );
        Ok(result.rows_affected())
    }

    /// Look up one row by key
    pub async fn get_by_id(
        &self,
        key: impl Into<Key> + Send,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Option<T>> {
        let query = self.get_by_id_query(key, includes)?;
        self.first(&query, RepositoryOperation::GetById).await
    }

    /// Look up one row by key values given in declared key order
    pub async fn get_by_ids(
        &self,
        values: Vec<Value>,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Option<T>> {
        self.get_by_id(Key::new(values), includes).await
    }

    /// The key lookup as an unexecuted query
    pub fn get_by_id_query(
        &self,
        key: impl Into<Key>,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Query<T>> {
        let (names, key) = self.checked_key(RepositoryOperation::GetById, key.into())?;
        let mut query =
            Query::new().filter(Filter::from_condition(sql::key_condition(&names, &key)));
        query.includes.extend(includes.iter().cloned());
        Ok(query)
    }

    /// The lookup by key values as an unexecuted query
    pub fn get_by_ids_query(
        &self,
        values: Vec<Value>,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Query<T>> {
        self.get_by_id_query(Key::new(values), includes)
    }

    /// The first row after filtering and ordering, if any
    pub async fn get_single(&self, options: QueryOptions<T>) -> RepositoryResult<Option<T>> {
        let query = self.get_single_query(options);
        self.first(&query, RepositoryOperation::GetSingle).await
    }

    /// `get_single` as an unexecuted query limited to one row
    pub fn get_single_query(&self, options: QueryOptions<T>) -> Query<T> {
        Query::from(options).take(1)
    }

    /// Every matching row in composed order
    pub async fn get_many(&self, options: QueryOptions<T>) -> RepositoryResult<Vec<T>> {
        let query = self.get_many_query(options);
        self.run(&query, RepositoryOperation::GetMany).await
    }

    /// `get_many` as an unexecuted query
    pub fn get_many_query(&self, options: QueryOptions<T>) -> Query<T> {
        Query::from(options)
    }

    /// One page of matching rows plus the size of the whole filtered set
    ///
    /// At least one order entry with a selector is required so that pages
    /// are well defined; without one the call fails before any I/O.
    pub async fn get_many_paged(
        &self,
        page: &Page<T>,
        options: QueryOptions<T>,
    ) -> RepositoryResult<Page<T>> {
        let op = RepositoryOperation::GetManyPaged;
        if !options.has_effective_order() {
            return Err(RepositoryError::contract_violation(
                op,
                "There are no order entries in the list",
            )
            .with_entity_type(T::schema().name));
        }
        for selector in options.order.iter().filter_map(|order| order.selector()) {
            FieldResolver::resolve(T::schema(), selector).map_err(|e| e.with_operation(op))?;
        }

        let total_rows = self
            .count(options.filter.as_ref())
            .await
            .map_err(|e| e.with_operation(op))?;
        let query = Query::from(options).page(page);
        let rows = self.run(&query, op).await?;

        tracing::debug!(
            entity = T::schema().name,
            page = page.page_number(),
            size = page.page_size(),
            total_rows,
            "Fetched page"
        );
        Ok(page.filled(rows, total_rows))
    }

    /// Execute a composed query
    pub async fn fetch(&self, query: &Query<T>) -> RepositoryResult<Vec<T>> {
        self.run(query, RepositoryOperation::GetMany).await
    }

    /// Execute a composed query, keeping at most the first row
    pub async fn fetch_optional(&self, query: &Query<T>) -> RepositoryResult<Option<T>> {
        self.first(query, RepositoryOperation::GetSingle).await
    }

    /// Count the rows a composed query filters to, ignoring its window
    pub async fn count_query(&self, query: &Query<T>) -> RepositoryResult<u64> {
        self.count(query.filter.as_ref()).await
    }

    async fn first(
        &self,
        query: &Query<T>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<Option<T>> {
        let take = query.take.map_or(1, |take| take.min(1));
        let query = query.clone().take(take);
        Ok(self.run(&query, operation).await?.into_iter().next())
    }

    async fn run(
        &self,
        query: &Query<T>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<Vec<T>> {
        let schema = T::schema();
        let order: Vec<(&FieldPath, OrderDirection)> = query
            .order
            .iter()
            .filter_map(|order| order.selector().map(|selector| (selector, order.direction())))
            .collect();
        let tie_breakers = if order.is_empty() {
            Vec::new()
        } else {
            self.key_names()
        };

        let spec = sql::Select {
            schema,
            condition: query.filter.as_ref().map(Filter::condition),
            order,
            tie_breakers: &tie_breakers,
            skip: query.skip,
            take: query.take,
        };
        let mut builder = sql::select(&spec).map_err(|e| e.with_operation(operation))?;

        tracing::debug!(
            entity = schema.name,
            table = schema.table,
            operation = %operation,
            "Fetching rows"
        );
        let mut rows = builder
            .build_query_as::<T>()
            .fetch_all(self.context.pool())
            .await
            .map_err(|e| self.fail(operation, e))?;

        for include in &query.includes {
            include.load(&self.context, &mut rows).await?;
        }
        Ok(rows)
    }
}

impl<T> Clone for GenericRepository<T> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for GenericRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericRepository")
            .field("context", &self.context)
            .finish()
    }
}
