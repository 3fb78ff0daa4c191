//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::storage::{field_equals, merge_fields, Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage
///
/// Used in development and tests. Data is lost when the process exits.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, E>>, DomainError> {
        self.entities
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn merge_in_place(
        &self,
        key: &E::Key,
        counter: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        let mut entities = self.write()?;

        let Some(slot) = entities.get_mut(key.as_str()) else {
            return Ok(None);
        };
        *slot = merge_fields(slot, counter, fields)?;
        Ok(Some(slot.clone()))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        Ok(self.read()?.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write()?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.write()?;

        match entities.get_mut(&key) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity)
            }
            None => Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            ))),
        }
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        self.write()?.insert(key, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.write()?.remove(key.as_str()).is_some())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.read()?.contains_key(key.as_str()))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }

    async fn find_by_field(&self, field: &'static str, value: &str) -> Result<Vec<E>, DomainError> {
        let entities = self.read()?;
        let mut matches = Vec::new();

        for entity in entities.values() {
            if field_equals(entity, field, value)? {
                matches.push(entity.clone());
            }
        }
        Ok(matches)
    }

    async fn patch(
        &self,
        key: &E::Key,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        self.merge_in_place(key, None, fields)
    }

    async fn increment(
        &self,
        key: &E::Key,
        counter: &'static str,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        self.merge_in_place(key, Some(counter), fields)
    }
}
