//! Comment endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ClientIp, IdempotencyKey};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::access::{NewCommentRequest, PublicComment, RequestContext};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    #[serde(default, alias = "postId")]
    pub content_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<PublicComment>,
}

/// GET /comments?contentId=
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let comments = state
        .orchestrator
        .list_approved_comments(query.content_id.as_deref())
        .await?;

    Ok(Json(CommentsResponse { comments }))
}

/// POST /comments
///
/// A repeated `Idempotency-Key` replays the first response verbatim.
pub async fn submit_comment(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    Json(request): Json<NewCommentRequest>,
) -> Result<Response, ApiError> {
    let ctx = RequestContext {
        client_ip,
        idempotency_key,
    };

    let stored = state.orchestrator.submit_comment(&ctx, request).await?;
    let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::CREATED);

    Ok((status, Json(stored.body)).into_response())
}
