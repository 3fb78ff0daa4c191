//! Site settings admin endpoints

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::settings::{ModerationPolicy, SiteSettings};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub site_title: Option<String>,
    pub comment_mode: ModerationPolicy,
}

/// GET /admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<SiteSettings>, ApiError> {
    Ok(Json(state.settings.get_settings().await?))
}

/// PUT /admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SiteSettings>, ApiError> {
    let site_title = request.site_title.filter(|t| !t.trim().is_empty());
    let saved = state
        .settings
        .save(SiteSettings::new(site_title, request.comment_mode))
        .await?;

    info!(admin = %admin, comment_mode = ?saved.comment_mode, "Site settings updated");

    Ok(Json(saved))
}
