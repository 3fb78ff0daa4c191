//! Free-text search over published items

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::access::SearchResults;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /search?q=&limit=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    Ok(Json(state.orchestrator.search(&query.q, query.limit).await?))
}
