//! Eager loading of related entities
//!
//! An [`Include<T>`] runs after the primary rows are fetched and attaches
//! related rows to them. The stock implementations issue one batched
//! `IN (..)` query per include, split into chunks to stay under SQLite's
//! bind-parameter limit, so loading never costs one query per row.
//!
//! # Example
//!
//! ```rust,ignore
//! let include = BelongsTo::new(
//!     "navigation_class",
//!     "navigation_class_id",
//!     |row: &mut ExampleClass, parent: Option<NavigationClass>| row.navigation_class = parent,
//! );
//! let rows = repository
//!     .get_many(QueryOptions::new().include(include))
//!     .await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;

use super::context::Context;
use super::entity::Entity;
use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::sql;
use super::value::Value;

/// Maximum values bound into one `IN (..)` list
pub const INCLUDE_CHUNK_SIZE: usize = 500;

/// Loads related rows onto already-fetched entities
#[async_trait]
pub trait Include<T>: Send + Sync {
    /// Navigation name, used in logs and errors
    fn name(&self) -> &str;

    /// Attach related rows to every entry of `rows`
    async fn load(&self, context: &Context, rows: &mut [T]) -> RepositoryResult<()>;
}

/// Fetch every `R` whose `column` is one of `values`, in chunks
async fn fetch_related<R: Entity>(
    context: &Context,
    column: &str,
    values: Vec<Value>,
) -> RepositoryResult<Vec<R>> {
    let schema = R::schema();
    let order = context.key_names(schema);
    let mut related = Vec::new();
    for chunk in values.chunks(INCLUDE_CHUNK_SIZE) {
        let mut builder = sql::select_in(schema, column, chunk, &order);
        let rows: Vec<R> = builder
            .build_query_as::<R>()
            .fetch_all(context.pool())
            .await
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation(RepositoryOperation::LoadRelated)
                    .with_entity_type(schema.name)
            })?;
        related.extend(rows);
    }
    debug!(
        entity = schema.name,
        column,
        loaded = related.len(),
        "loaded related rows"
    );
    Ok(related)
}

fn require_column(schema: &'static super::entity::Schema, column: &str) -> RepositoryResult<()> {
    if schema.has_column(column) {
        Ok(())
    } else {
        Err(RepositoryError::contract_violation(
            RepositoryOperation::LoadRelated,
            format!("`{}` is not a column of {}", column, schema.name),
        )
        .with_entity_type(schema.name))
    }
}

/// Distinct non-null values of `column` across `rows`, in first-seen order
fn distinct_values<T: Entity>(rows: &[T], column: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.value_of(column))
        .filter(|value| !value.is_null())
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Loads the single parent `R` that each `T` points at
pub struct BelongsTo<T, R> {
    name: &'static str,
    foreign_key: &'static str,
    target_column: Option<&'static str>,
    assign: fn(&mut T, Option<R>),
    _entities: PhantomData<fn() -> (T, R)>,
}

impl<T: Entity, R: Entity + Clone> BelongsTo<T, R> {
    /// Parent found by matching `T.foreign_key` against `R`'s first key column
    pub fn new(
        name: &'static str,
        foreign_key: &'static str,
        assign: fn(&mut T, Option<R>),
    ) -> Self {
        Self {
            name,
            foreign_key,
            target_column: None,
            assign,
            _entities: PhantomData,
        }
    }

    /// Match against `column` on `R` instead of its key
    #[must_use]
    pub fn references(mut self, column: &'static str) -> Self {
        self.target_column = Some(column);
        self
    }

    fn target_column(&self, context: &Context) -> RepositoryResult<&'static str> {
        self.target_column
            .or_else(|| context.key_names(R::schema()).first().copied())
            .ok_or_else(|| {
                RepositoryError::contract_violation(
                    RepositoryOperation::LoadRelated,
                    format!("{} declares no key to reference", R::schema().name),
                )
            })
    }
}

#[async_trait]
impl<T, R> Include<T> for BelongsTo<T, R>
where
    T: Entity,
    R: Entity + Clone,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self, context: &Context, rows: &mut [T]) -> RepositoryResult<()> {
        require_column(T::schema(), self.foreign_key)?;
        let target_column = self.target_column(context)?;
        require_column(R::schema(), target_column)?;

        let wanted = distinct_values(rows, self.foreign_key);
        let parents: HashMap<Value, R> = if wanted.is_empty() {
            HashMap::new()
        } else {
            fetch_related::<R>(context, target_column, wanted)
                .await?
                .into_iter()
                .filter_map(|parent| parent.value_of(target_column).map(|value| (value, parent)))
                .collect()
        };

        for row in rows.iter_mut() {
            let parent = row
                .value_of(self.foreign_key)
                .and_then(|value| parents.get(&value).cloned());
            (self.assign)(row, parent);
        }
        Ok(())
    }
}

impl<T, R> fmt::Debug for BelongsTo<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .finish_non_exhaustive()
    }
}

/// Loads every `R` that points back at each `T`
pub struct HasMany<T, R> {
    name: &'static str,
    foreign_key: &'static str,
    local_column: Option<&'static str>,
    assign: fn(&mut T, Vec<R>),
    _entities: PhantomData<fn() -> (T, R)>,
}

impl<T: Entity, R: Entity + Clone> HasMany<T, R> {
    /// Children found by matching `R.foreign_key` against `T`'s first key column
    pub fn new(
        name: &'static str,
        foreign_key: &'static str,
        assign: fn(&mut T, Vec<R>),
    ) -> Self {
        Self {
            name,
            foreign_key,
            local_column: None,
            assign,
            _entities: PhantomData,
        }
    }

    /// Match against `column` on `T` instead of its key
    #[must_use]
    pub fn from_column(mut self, column: &'static str) -> Self {
        self.local_column = Some(column);
        self
    }

    fn local_column(&self, context: &Context) -> RepositoryResult<&'static str> {
        self.local_column
            .or_else(|| context.key_names(T::schema()).first().copied())
            .ok_or_else(|| {
                RepositoryError::contract_violation(
                    RepositoryOperation::LoadRelated,
                    format!("{} declares no key to match children on", T::schema().name),
                )
            })
    }
}

#[async_trait]
impl<T, R> Include<T> for HasMany<T, R>
where
    T: Entity,
    R: Entity + Clone,
{
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self, context: &Context, rows: &mut [T]) -> RepositoryResult<()> {
        let local_column = self.local_column(context)?;
        require_column(T::schema(), local_column)?;
        require_column(R::schema(), self.foreign_key)?;

        let wanted = distinct_values(rows, local_column);
        let mut children: HashMap<Value, Vec<R>> = HashMap::new();
        if !wanted.is_empty() {
            for child in fetch_related::<R>(context, self.foreign_key, wanted).await? {
                if let Some(value) = child.value_of(self.foreign_key) {
                    children.entry(value).or_default().push(child);
                }
            }
        }

        for row in rows.iter_mut() {
            let related = row
                .value_of(local_column)
                .and_then(|value| children.get(&value).cloned())
                .unwrap_or_default();
            (self.assign)(row, related);
        }
        Ok(())
    }
}

impl<T, R> fmt::Debug for HasMany<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entity::{KeyMetadata, Schema};
    use crate::repository::fixtures::{seeded_context, Category, Widget};

    /// Reports no key columns for categories
    struct KeylessCategories;

    impl KeyMetadata for KeylessCategories {
        fn key_names(&self, schema: &'static Schema) -> Vec<&'static str> {
            if schema.table == "categories" {
                Vec::new()
            } else {
                schema.key.to_vec()
            }
        }
    }

    async fn widgets(context: &Context) -> Vec<Widget> {
        sqlx::query_as::<_, Widget>("SELECT * FROM widgets ORDER BY id")
            .fetch_all(context.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_belongs_to_attaches_parent() {
        let context = seeded_context().await;
        let mut rows = widgets(&context).await;

        Widget::category_include().load(&context, &mut rows).await.unwrap();

        let bolt = rows.iter().find(|w| w.name == "bolt").unwrap();
        assert_eq!(bolt.category.as_ref().map(|c| c.name.as_str()), Some("hardware"));
        let orphan = rows.iter().find(|w| w.category_id.is_none()).unwrap();
        assert!(orphan.category.is_none());
    }

    #[tokio::test]
    async fn test_has_many_groups_children() {
        let context = seeded_context().await;
        let mut categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id")
            .fetch_all(context.pool())
            .await
            .unwrap();

        Category::widgets_include()
            .load(&context, &mut categories)
            .await
            .unwrap();

        let hardware = categories.iter().find(|c| c.name == "hardware").unwrap();
        let names: Vec<&str> = hardware.widgets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["bolt", "nut"]);
        let empty = categories.iter().find(|c| c.name == "empty").unwrap();
        assert!(empty.widgets.is_empty());
    }

    #[tokio::test]
    async fn test_empty_rows_make_no_query() {
        let context = seeded_context().await;
        context.pool().close().await;
        let mut rows: Vec<Widget> = Vec::new();
        Widget::category_include().load(&context, &mut rows).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_foreign_key_is_contract_violation() {
        let context = seeded_context().await;
        let mut rows = widgets(&context).await;
        let include: BelongsTo<Widget, Category> =
            BelongsTo::new("category", "owner_id", |row, parent| row.category = parent);
        let err = include.load(&context, &mut rows).await.unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(include.name(), "category");
    }

    #[tokio::test]
    async fn test_default_columns_come_from_key_metadata() {
        let context = seeded_context().await.with_key_metadata(KeylessCategories);
        let mut rows = widgets(&context).await;

        let err = Widget::category_include()
            .load(&context, &mut rows)
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());

        let mut categories = sqlx::query_as::<_, Category>("SELECT * FROM categories")
            .fetch_all(context.pool())
            .await
            .unwrap();
        let err = Category::widgets_include()
            .load(&context, &mut categories)
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());

        Widget::category_include()
            .references("id")
            .load(&context, &mut rows)
            .await
            .unwrap();
        let bolt = rows.iter().find(|w| w.name == "bolt").unwrap();
        assert!(bolt.category.is_some());
    }

    #[test]
    fn test_distinct_values_skips_nulls_and_duplicates() {
        let mut a = Widget::new(1, "a");
        a.category_id = Some(4);
        let mut b = Widget::new(2, "b");
        b.category_id = Some(4);
        let c = Widget::new(3, "c");
        let values = distinct_values(&[a, b, c], "category_id");
        assert_eq!(values, vec![Value::Integer(4)]);
    }
}
