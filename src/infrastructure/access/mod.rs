//! Access orchestration for the public and programmatic surfaces

mod orchestrator;
mod requests;

pub use orchestrator::{
    AccessOrchestrator, AccessOrchestratorDeps, RequestContext, ALL_CATEGORIES,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, MIN_SEARCH_CHARS,
};
pub use requests::{
    CommentReceipt, ContentSummary, ContentView, NewCommentRequest, NewContentRequest,
    Pagination, PaywallDescriptor, PostsPage, PublicComment, SearchHit, SearchResults,
    MAX_COMMENT_CHARS,
};
