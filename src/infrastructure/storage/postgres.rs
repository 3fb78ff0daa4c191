//! PostgreSQL storage implementation
//!
//! Every entity type lives in its own table of `(key, data JSONB)` rows. All
//! tables share one connection pool.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use serde_json::{Map, Value};
use sqlx::Row;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// PostgreSQL connection settings
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Open a connection pool
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// JSONB-table storage for one entity type
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: &'static str,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    /// Table names come from the migration set, never from input
    pub fn new(pool: PgPool, table_name: &'static str) -> Self {
        Self {
            pool,
            table_name,
            _phantom: PhantomData,
        }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row.get("data");
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize entity: {}", e)))
    }

    fn encode(entity: &E) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))
    }

    async fn merge(
        &self,
        key: &E::Key,
        query: &str,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        let row = sqlx::query(query)
            .bind(key.as_str())
            .bind(Value::Object(fields))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to patch entity: {}", e)))?;

        row.as_ref().map(Self::decode).transpose()
    }
}

/// Field names are inlined so the `data->>'field'` expression indexes apply
fn checked_field(field: &str) -> Result<&str, DomainError> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DomainError::storage(format!("Invalid field name '{}'", field)));
    }
    Ok(field)
}

fn find_by_field_sql(table: &str, field: &str) -> Result<String, DomainError> {
    Ok(format!(
        "SELECT data FROM {} WHERE data->>'{}' = $1 ORDER BY created_at",
        table,
        checked_field(field)?
    ))
}

fn patch_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET data = data || $2, updated_at = NOW() WHERE key = $1 RETURNING data",
        table
    )
}

fn increment_sql(table: &str, counter: &str) -> Result<String, DomainError> {
    let counter = checked_field(counter)?;
    Ok(format!(
        r#"
        UPDATE {table}
        SET data = (data || $2)
                || jsonb_build_object('{counter}', COALESCE((data->>'{counter}')::bigint, 0) + 1),
            updated_at = NOW()
        WHERE key = $1
        RETURNING data
        "#
    ))
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get entity: {}", e)))?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let query = format!("SELECT data FROM {} ORDER BY created_at", self.table_name);

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list entities: {}", e)))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = Self::encode(&entity)?;
        let query = format!("INSERT INTO {} (key, data) VALUES ($1, $2)", self.table_name);

        sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("Entity with key '{}' already exists", key))
                }
                _ => DomainError::storage(format!("Failed to create entity: {}", e)),
            })?;

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = Self::encode(&entity)?;
        let query = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update entity: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        Ok(entity)
    }

    async fn save(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = Self::encode(&entity)?;
        let query = format!(
            r#"
            INSERT INTO {} (key, data) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to save entity: {}", e)))?;

        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE key = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete entity: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", self.table_name);

        let row = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count entities: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn find_by_field(&self, field: &'static str, value: &str) -> Result<Vec<E>, DomainError> {
        let query = find_by_field_sql(self.table_name, field)?;

        let rows = sqlx::query(&query)
            .bind(value)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query entities: {}", e)))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn patch(
        &self,
        key: &E::Key,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        self.merge(key, &patch_sql(self.table_name), fields).await
    }

    async fn increment(
        &self,
        key: &E::Key,
        counter: &'static str,
        fields: Map<String, Value>,
    ) -> Result<Option<E>, DomainError> {
        let query = increment_sql(self.table_name, counter)?;
        self.merge(key, &query, fields).await
    }
}
