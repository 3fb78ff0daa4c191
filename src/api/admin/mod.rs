//! Admin endpoints: moderation, site settings and API key management

pub mod api_keys;
pub mod comments;
pub mod settings;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Comment moderation
        .route("/comments", get(comments::list_comments))
        .route("/comments/{comment_id}", patch(comments::update_comment_status))
        .route("/comments/{comment_id}", delete(comments::delete_comment))
        // Site settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
        // API key management
        .route("/api-keys", get(api_keys::list_api_keys))
        .route("/api-keys", post(api_keys::create_api_key))
        .route("/api-keys/{key_id}", patch(api_keys::set_api_key_active))
        .route("/api-keys/{key_id}", delete(api_keys::delete_api_key))
}
