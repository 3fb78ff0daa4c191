//! Storage factory for runtime backend selection

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::domain::storage::{Storage, StorageEntity};

use super::in_memory::InMemoryStorage;
use super::postgres::PostgresStorage;

/// Selected storage backend, holding the shared pool when one is needed
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    Postgres(PgPool),
}

impl StorageBackend {
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::InMemory => None,
            Self::Postgres(pool) => Some(pool),
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Create storage for one entity type on the selected backend
    pub fn create<E>(backend: &StorageBackend, table_name: &'static str) -> Arc<dyn Storage<E>>
    where
        E: StorageEntity + 'static,
    {
        match backend {
            StorageBackend::InMemory => Arc::new(InMemoryStorage::<E>::new()),
            StorageBackend::Postgres(pool) => {
                Arc::new(PostgresStorage::<E>::new(pool.clone(), table_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentItem;

    #[tokio::test]
    async fn test_in_memory_backend_creates_working_storage() {
        let storage =
            StorageFactory::create::<ContentItem>(&StorageBackend::InMemory, "content_items");
        storage
            .create(ContentItem::new("a", "A", "b", "dx"))
            .await
            .unwrap();

        assert_eq!(storage.count().await.unwrap(), 1);
        assert!(StorageBackend::InMemory.pool().is_none());
    }
}
