//! Entity metadata
//!
//! An [`Entity`] is a row type the repository can read, write and compose
//! queries over. Everything the repository needs to know about it is static:
//! the [`Schema`] names the table, its scalar columns, the ordered key
//! columns and the to-one navigations a field path may walk through.
//!
//! # Example
//!
//! ```rust
//! use service_base::repository::{Entity, Field, Join, Schema, Value};
//!
//! #[derive(Debug, Clone, sqlx::FromRow)]
//! struct Shelf {
//!     id: i64,
//!     label: String,
//! }
//!
//! static SHELF: Schema = Schema {
//!     name: "Shelf",
//!     table: "shelves",
//!     columns: &["id", "label"],
//!     key: &["id"],
//!     generated_key: true,
//!     joins: &[],
//! };
//!
//! impl Shelf {
//!     const LABEL: Field<Shelf> = Field::new("label");
//! }
//!
//! impl Entity for Shelf {
//!     fn schema() -> &'static Schema {
//!         &SHELF
//!     }
//!
//!     fn values(&self) -> Vec<(&'static str, Value)> {
//!         vec![("id", self.id.into()), ("label", self.label.clone().into())]
//!     }
//! }
//!
//! assert!(Shelf::schema().has_column("label"));
//! ```

use sqlx::{sqlite::SqliteRow, FromRow};

use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::value::{Key, Value};

/// A to-one navigation from one entity to another
///
/// Walking the navigation joins `local_column` on the owning table to
/// `remote_column` on the target table.
#[derive(Debug)]
pub struct Join {
    /// Segment name used in field paths
    pub name: &'static str,
    /// Column on the owning table
    pub local_column: &'static str,
    /// Column on the target table
    pub remote_column: &'static str,
    /// Schema of the target entity
    pub target: fn() -> &'static Schema,
}

/// Static description of an entity's table
#[derive(Debug)]
pub struct Schema {
    /// Entity name used in errors and logs
    pub name: &'static str,
    /// Table name
    pub table: &'static str,
    /// Persisted scalar columns
    pub columns: &'static [&'static str],
    /// Key columns in declared order
    pub key: &'static [&'static str],
    /// Whether the store assigns the key on insert
    pub generated_key: bool,
    /// To-one navigations reachable from this entity
    pub joins: &'static [Join],
}

impl Schema {
    /// Whether `column` is a persisted scalar column
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// Look up a navigation by its path segment
    pub fn join(&self, name: &str) -> Option<&'static Join> {
        self.joins.iter().find(|join| join.name == name)
    }

    /// Whether `column` is part of the key
    pub fn is_key_column(&self, column: &str) -> bool {
        self.key.contains(&column)
    }
}

/// A row type the generic repository can manage
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Static table description
    fn schema() -> &'static Schema;

    /// Persisted scalar values, one pair per schema column
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// The value of a single persisted column
    fn value_of(&self, column: &str) -> Option<Value> {
        self.values()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Extract this entity's key in the given column order
    fn key_for(&self, key_names: &[&'static str]) -> RepositoryResult<Key> {
        let values = self.values();
        let mut parts = Vec::with_capacity(key_names.len());
        for name in key_names {
            let value = values
                .iter()
                .find(|(column, _)| column == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    RepositoryError::contract_violation(
                        RepositoryOperation::Update,
                        format!("key column `{}` is not among the entity's values", name),
                    )
                    .with_entity_type(Self::schema().name)
                })?;
            parts.push(value);
        }
        Ok(Key::new(parts))
    }
}

/// Supplies the ordered key column names of an entity
///
/// The persistence collaborator owns this knowledge; the repository only
/// asks for it.
pub trait KeyMetadata: Send + Sync {
    /// Key columns of `schema`, in declared order
    fn key_names(&self, schema: &'static Schema) -> Vec<&'static str>;
}

/// Key metadata read straight from each entity's declared [`Schema`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredKeys;

impl KeyMetadata for DeclaredKeys {
    fn key_names(&self, schema: &'static Schema) -> Vec<&'static str> {
        schema.key.to_vec()
    }
}
