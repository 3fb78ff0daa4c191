//! Keyed post listing

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::access::PostsPage;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPostsQuery {
    /// `all` or empty means every category
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

/// GET /public/posts?category=&limit=&offset=
pub async fn list_posts(
    State(state): State<AppState>,
    RequireApiKey(_caller): RequireApiKey,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostsPage>, ApiError> {
    let page = state
        .orchestrator
        .list_posts(query.category, query.limit, query.offset)
        .await?;

    Ok(Json(page))
}
