//! API key entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};

/// API key identifier (UUID string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(String);

impl ApiKeyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for ApiKeyId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// A stored API key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    id: ApiKeyId,
    name: String,
    /// Digest of the secret, never the secret itself
    secret_hash: String,
    /// Leading characters of the secret, for display only
    key_prefix: String,
    active: bool,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    usage_count: u64,
    #[serde(default)]
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for ApiKey {
    type Key = ApiKeyId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl ApiKey {
    /// Serialized name of the usage counter
    pub const USAGE_COUNT_FIELD: &'static str = "usageCount";

    /// Create a new active key
    pub fn new(
        name: impl Into<String>,
        secret_hash: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: ApiKeyId::generate(),
            name: name.into(),
            secret_hash: secret_hash.into(),
            key_prefix: key_prefix.into(),
            active: true,
            created_by: None,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_created_by(mut self, principal: impl Into<String>) -> Self {
        self.created_by = Some(principal.into());
        self
    }

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Identity recorded on content created with this key
    pub fn principal(&self) -> &str {
        self.created_by.as_deref().unwrap_or(&self.name)
    }

    /// Stored fields changed when a key is enabled or disabled
    pub fn activation_fields(active: bool) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("active".to_string(), Value::Bool(active));
        fields.insert("updatedAt".to_string(), json!(Utc::now()));
        fields
    }

    /// Stored fields set alongside a bump of [`ApiKey::USAGE_COUNT_FIELD`]
    pub fn usage_fields(at: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("lastUsedAt".to_string(), json!(at));
        fields
    }
}

/// Identity attached to a request that presented a valid key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedKey {
    pub id: ApiKeyId,
    pub name: String,
    pub principal: String,
}

impl From<&ApiKey> for AuthenticatedKey {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().clone(),
            name: key.name().to_string(),
            principal: key.principal().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_key_is_active_and_unused() {
        let key = ApiKey::new("ci", "sha256$abc", "blog_abcd");

        assert!(key.is_active());
        assert_eq!(key.usage_count(), 0);
        assert!(key.last_used_at().is_none());
    }

    #[test]
    fn test_principal_falls_back_to_name() {
        let key = ApiKey::new("ci", "h", "p");
        assert_eq!(key.principal(), "ci");

        let key = key.with_created_by("ops@example.com");
        assert_eq!(key.principal(), "ops@example.com");
    }

    #[test]
    fn test_update_fields_use_stored_names() {
        let now = Utc::now();
        let usage = ApiKey::usage_fields(now);
        let activation = ApiKey::activation_fields(false);

        assert_eq!(usage.len(), 1);
        assert_eq!(usage["lastUsedAt"], json!(now));
        assert_eq!(activation["active"], Value::Bool(false));
        assert!(activation.contains_key("updatedAt"));

        let json = serde_json::to_value(ApiKey::new("ci", "h", "p")).unwrap();
        assert!(json.get(ApiKey::USAGE_COUNT_FIELD).is_some());
    }

    #[test]
    fn test_serialization_never_contains_plaintext_fields() {
        let key = ApiKey::new("ci", "sha256$digest", "blog_ab");
        let json = serde_json::to_value(&key).unwrap();

        assert_eq!(json["secretHash"], "sha256$digest");
        assert!(json.get("secret").is_none());
    }
}
