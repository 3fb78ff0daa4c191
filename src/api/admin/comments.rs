//! Comment moderation admin endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::comment::{Comment, CommentId, CommentStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CommentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListCommentsResponse {
    pub comments: Vec<Comment>,
    pub total: usize,
}

/// GET /admin/comments?status=
pub async fn list_comments(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<ListCommentsResponse>, ApiError> {
    let status = query
        .status
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<CommentStatus>())
        .transpose()
        .map_err(ApiError::bad_request)?;

    let comments = state.comments.list(status).await?;
    let total = comments.len();

    Ok(Json(ListCommentsResponse { comments, total }))
}

/// PATCH /admin/comments/{comment_id}
pub async fn update_comment_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(comment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state
        .comments
        .update_status(&CommentId::new(comment_id), request.status)
        .await?;

    info!(
        comment_id = %comment.id(),
        status = comment.status().as_str(),
        admin = %admin,
        "Comment moderated"
    );

    Ok(Json(comment))
}

/// DELETE /admin/comments/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .comments
        .delete(&CommentId::new(comment_id.clone()))
        .await?;

    if !deleted {
        return Err(ApiError::not_found(format!(
            "Comment '{}' not found",
            comment_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
