//! Public content, search and comment endpoints

pub mod comments;
pub mod content;
pub mod posts;
pub mod search;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create the public router
pub fn create_public_router() -> Router<AppState> {
    Router::new()
        .route(
            "/comments",
            get(comments::list_comments).post(comments::submit_comment),
        )
        .route(
            "/content",
            get(content::list_content).post(content::create_content),
        )
        .route("/content/{slug}", get(content::get_content))
        .route("/public/posts", get(posts::list_posts))
        .route("/search", get(search::search))
}
