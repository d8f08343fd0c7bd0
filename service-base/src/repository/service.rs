//! Overridable entity services
//!
//! [`EntityService<T>`] is the surface consumers build on. Implementors
//! supply the repository; every operation has a default that forwards to
//! it. Override any default to change its behaviour, or add
//! entity-specific operations next to the trait impl.
//!
//! Methods use RPITIT (Return Position Impl Trait In Traits), so no
//! `async_trait` is needed.
//!
//! # Example
//!
//! ```rust,ignore
//! struct ExampleService {
//!     repository: GenericRepository<ExampleClass>,
//! }
//!
//! impl EntityService<ExampleClass> for ExampleService {
//!     fn repository(&self) -> &GenericRepository<ExampleClass> {
//!         &self.repository
//!     }
//! }
//!
//! let total = service.count(None).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use super::entity::Entity;
use super::error::RepositoryResult;
use super::filter::Filter;
use super::generic::GenericRepository;
use super::include::Include;
use super::page::Page;
use super::query::{Query, QueryOptions};
use super::value::{Key, Value};

/// Base service for entity `T`
pub trait EntityService<T: Entity>: Send + Sync {
    /// The repository every default forwards to
    fn repository(&self) -> &GenericRepository<T>;

    /// Number of rows matching `filter`, or every row
    fn count(
        &self,
        filter: Option<&Filter<T>>,
    ) -> impl Future<Output = RepositoryResult<u64>> + Send {
        self.repository().count(filter)
    }

    /// Insert one entity
    fn create(&self, entity: &T) -> impl Future<Output = RepositoryResult<T>> + Send {
        self.repository().create(entity)
    }

    /// Insert a batch in one transaction
    fn create_many(&self, entities: &[T]) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send {
        self.repository().create_many(entities)
    }

    /// Overwrite an existing entity
    fn update(&self, entity: &T) -> impl Future<Output = RepositoryResult<T>> + Send {
        self.repository().update(entity)
    }

    /// Delete by key
    fn delete(
        &self,
        key: impl Into<Key> + Send,
    ) -> impl Future<Output = RepositoryResult<()>> + Send {
        self.repository().delete(key)
    }

    /// Delete every row
    fn clear_entity(&self) -> impl Future<Output = RepositoryResult<u64>> + Send {
        self.repository().clear_entity()
    }

    /// Look up by key
    fn get_by_id(
        &self,
        key: impl Into<Key> + Send,
        includes: &[Arc<dyn Include<T>>],
    ) -> impl Future<Output = RepositoryResult<Option<T>>> + Send {
        self.repository().get_by_id(key, includes)
    }

    /// Look up by key values in declared order
    fn get_by_ids(
        &self,
        values: Vec<Value>,
        includes: &[Arc<dyn Include<T>>],
    ) -> impl Future<Output = RepositoryResult<Option<T>>> + Send {
        self.repository().get_by_ids(values, includes)
    }

    /// Key lookup as an unexecuted query
    fn get_by_id_query(
        &self,
        key: impl Into<Key>,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Query<T>> {
        self.repository().get_by_id_query(key, includes)
    }

    /// Key-values lookup as an unexecuted query
    fn get_by_ids_query(
        &self,
        values: Vec<Value>,
        includes: &[Arc<dyn Include<T>>],
    ) -> RepositoryResult<Query<T>> {
        self.repository().get_by_ids_query(values, includes)
    }

    /// First row after filter and order
    fn get_single(
        &self,
        options: QueryOptions<T>,
    ) -> impl Future<Output = RepositoryResult<Option<T>>> + Send {
        self.repository().get_single(options)
    }

    /// `get_single` as an unexecuted query
    fn get_single_query(&self, options: QueryOptions<T>) -> Query<T> {
        self.repository().get_single_query(options)
    }

    /// Every matching row
    fn get_many(
        &self,
        options: QueryOptions<T>,
    ) -> impl Future<Output = RepositoryResult<Vec<T>>> + Send {
        self.repository().get_many(options)
    }

    /// `get_many` as an unexecuted query
    fn get_many_query(&self, options: QueryOptions<T>) -> Query<T> {
        self.repository().get_many_query(options)
    }

    /// One page of matching rows
    fn get_many_paged(
        &self,
        page: &Page<T>,
        options: QueryOptions<T>,
    ) -> impl Future<Output = RepositoryResult<Page<T>>> + Send {
        self.repository().get_many_paged(page, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seeded_context, Widget};
    use crate::repository::{Context, OrderBy, RepositoryError, RepositoryOperation};

    struct WidgetService {
        repository: GenericRepository<Widget>,
    }

    impl WidgetService {
        fn new(context: Context) -> Self {
            Self {
                repository: GenericRepository::new(context),
            }
        }

        async fn get_many_named(&self, name: &str) -> RepositoryResult<Vec<Widget>> {
            self.get_many(QueryOptions::new().filter(Widget::NAME.eq(name))).await
        }
    }

    impl EntityService<Widget> for WidgetService {
        fn repository(&self) -> &GenericRepository<Widget> {
            &self.repository
        }
    }

    /// Refuses to clear, overriding the default
    struct GuardedService(GenericRepository<Widget>);

    impl EntityService<Widget> for GuardedService {
        fn repository(&self) -> &GenericRepository<Widget> {
            &self.0
        }

        async fn clear_entity(&self) -> RepositoryResult<u64> {
            Err(RepositoryError::contract_violation(
                RepositoryOperation::Clear,
                "clearing widgets is disabled",
            ))
        }
    }

    #[tokio::test]
    async fn test_defaults_forward_to_repository() {
        let service = WidgetService::new(seeded_context().await);

        assert_eq!(service.count(None).await.unwrap(), 3);
        let created = service.create(&Widget::new(0, "washer")).await.unwrap();
        assert_eq!(service.get_many_named("washer").await.unwrap(), vec![created.clone()]);

        let page = service
            .get_many_paged(&Page::new(1, 2), QueryOptions::new().order_by(OrderBy::path("name")))
            .await
            .unwrap();
        assert_eq!(page.total_rows(), 4);
        assert_eq!(page.rows().len(), 2);

        service.delete(created.id).await.unwrap();
        assert!(service.get_by_id(created.id, &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_override_replaces_default() {
        let context = seeded_context().await;
        let service = GuardedService(GenericRepository::new(context));

        let err = service.clear_entity().await.unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(service.count(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_service_futures_are_send() {
        let service = std::sync::Arc::new(WidgetService::new(seeded_context().await));
        let handle = tokio::spawn({
            let service = service.clone();
            async move { service.count(None).await }
        });
        assert_eq!(handle.await.unwrap().unwrap(), 3);
    }
}
