//! API key management admin endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::api_key::{ApiKey, ApiKeyId};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// API key as shown to admins; the secret is never included
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    /// Masked display form, e.g. `blog_ab12…`
    pub key_prefix: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub usage_count: u64,
    pub last_used_at: Option<String>,
    pub created_at: String,
}

impl From<&ApiKey> for ApiKeyResponse {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().as_str().to_string(),
            name: key.name().to_string(),
            key_prefix: format!("{}…", key.key_prefix()),
            is_active: key.is_active(),
            created_by: key.created_by().map(String::from),
            usage_count: key.usage_count(),
            last_used_at: key.last_used_at().map(|dt| dt.to_rfc3339()),
            created_at: key.created_at().to_rfc3339(),
        }
    }
}

/// Returned exactly once, on creation
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyWithSecretResponse {
    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListApiKeysResponse {
    pub api_keys: Vec<ApiKeyResponse>,
    pub total: usize,
}

/// GET /admin/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    let keys = state.api_key_service.list().await?;

    let api_keys: Vec<ApiKeyResponse> = keys.iter().map(ApiKeyResponse::from).collect();
    let total = api_keys.len();

    Ok(Json(ListApiKeysResponse { api_keys, total }))
}

/// POST /admin/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyWithSecretResponse>), ApiError> {
    debug!(name = %request.name, "Admin creating API key");

    let created = state
        .api_key_service
        .create(request.name, Some(admin))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyWithSecretResponse {
            api_key: ApiKeyResponse::from(&created.api_key),
            secret: created.secret,
        }),
    ))
}

/// PATCH /admin/api-keys/{key_id}
pub async fn set_api_key_active(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(key_id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let key = state
        .api_key_service
        .set_active(&ApiKeyId::new(key_id), request.active)
        .await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// DELETE /admin/api-keys/{key_id}
pub async fn delete_api_key(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(key_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .api_key_service
        .delete(&ApiKeyId::new(key_id.clone()))
        .await?;

    if !deleted {
        return Err(ApiError::not_found(format!("API key '{}' not found", key_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_masks_key() {
        let key = ApiKey::new("ci", "sha256$digest", "blog_ab12");
        let response = ApiKeyResponse::from(&key);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["keyPrefix"], "blog_ab12…");
        assert_eq!(json["isActive"], true);
        assert!(json.get("secret").is_none());
        assert!(!json.to_string().contains("digest"));
    }
}
