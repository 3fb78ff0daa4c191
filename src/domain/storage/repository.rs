//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Generic storage trait for CRUD operations on any entity type
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Creates a new entity, returns a conflict if the key is taken
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns not found if absent
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Creates or replaces an entity
    async fn save(&self, entity: E) -> Result<E, DomainError> {
        if self.exists(entity.key()).await? {
            self.update(entity).await
        } else {
            self.create(entity).await
        }
    }

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }

    /// Entities whose top-level string field `field` equals `value`
    ///
    /// `field` is the serialized (camelCase) name and always comes from code.
    async fn find_by_field(&self, field: &'static str, value: &str) -> Result<Vec<E>, DomainError> {
        let mut matches = Vec::new();
        for entity in self.list().await? {
            if field_equals(&entity, field, value)? {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    /// Merges top-level fields into a stored entity as one atomic write
    ///
    /// Fields not named in `fields` keep their stored values. Returns `None`
    /// when the key is absent.
    async fn patch(
        &self,
        key: &E::Key,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError>;

    /// Adds one to the integer field `counter` and merges `fields`, atomically
    async fn increment(
        &self,
        key: &E::Key,
        counter: &'static str,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError>;
}

/// Whether the serialized entity has `field` set to the string `value`
pub fn field_equals<E>(entity: &E, field: &str, value: &str) -> Result<bool, DomainError>
where
    E: StorageEntity,
{
    let json = serde_json::to_value(entity)
        .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

    Ok(json.get(field).and_then(Value::as_str) == Some(value))
}

/// Applies a patch (and optional counter bump) to an entity through its JSON form
pub fn merge_fields<E>(
    entity: &E,
    counter: Option<&str>,
    fields: Map<String, Value>,
) -> Result<E, DomainError>
where
    E: StorageEntity,
{
    let mut json = serde_json::to_value(entity)
        .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

    let Value::Object(object) = &mut json else {
        return Err(DomainError::storage("Entity is not stored as a JSON object"));
    };

    if let Some(counter) = counter {
        let next = object.get(counter).and_then(Value::as_u64).unwrap_or(0).saturating_add(1);
        object.insert(counter.to_string(), Value::from(next));
    }
    object.extend(fields);

    serde_json::from_value(json)
        .map_err(|e| DomainError::storage(format!("Failed to apply field update: {}", e)))
}
