//! Content endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::content::ContentItem;
use crate::infrastructure::access::{ContentSummary, ContentView, NewContentRequest};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListContentQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListContentResponse {
    pub items: Vec<ContentSummary>,
}

/// GET /content?category=&limit=
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ListContentQuery>,
) -> Result<Json<ListContentResponse>, ApiError> {
    let items = state
        .orchestrator
        .list_content(query.category, query.limit)
        .await?;

    Ok(Json(ListContentResponse { items }))
}

/// GET /content/{slug}
pub async fn get_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentView>, ApiError> {
    Ok(Json(state.orchestrator.read_content(&slug).await?))
}

/// POST /content
pub async fn create_content(
    State(state): State<AppState>,
    RequireApiKey(caller): RequireApiKey,
    Json(request): Json<NewContentRequest>,
) -> Result<(StatusCode, Json<ContentItem>), ApiError> {
    let item = state.orchestrator.create_content(&caller, request).await?;

    Ok((StatusCode::CREATED, Json(item)))
}
