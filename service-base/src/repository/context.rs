//! Persistence context
//!
//! A [`Context`] is the unit-of-work handle the repository runs against: a
//! sqlx pool plus the [`KeyMetadata`] provider that names each entity's key
//! columns. Cloning is cheap and clones share the pool.

use std::fmt;
use std::sync::Arc;

use sqlx::SqlitePool;

use super::entity::{DeclaredKeys, KeyMetadata, Schema};
use crate::config::DatabaseConfig;

/// Pool handle plus key metadata
#[derive(Clone)]
pub struct Context {
    pool: SqlitePool,
    keys: Arc<dyn KeyMetadata>,
}

impl Context {
    /// Wrap an existing pool, reading keys from each entity's schema
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            keys: Arc::new(DeclaredKeys),
        }
    }

    /// Replace the key metadata provider
    #[must_use]
    pub fn with_key_metadata(mut self, keys: impl KeyMetadata + 'static) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    /// Connect using the database configuration
    pub async fn connect(config: &DatabaseConfig) -> crate::Result<Self> {
        let pool = crate::database::create_pool(config).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ordered key column names of `schema`
    pub fn key_names(&self, schema: &'static Schema) -> Vec<&'static str> {
        self.keys.key_names(schema)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("pool_size", &self.pool.size())
            .field("pool_closed", &self.pool.is_closed())
            .finish_non_exhaustive()
    }
}
