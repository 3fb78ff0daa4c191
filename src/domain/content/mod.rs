//! Content domain
//!
//! Content items, paywall splitting and public excerpts.

mod entity;
mod excerpt;
mod repository;
mod splitter;

pub use entity::{ContentId, ContentItem, ContentStatus, FreePreviewMode, PaywallConfig};
pub use excerpt::{excerpt_from_preview, preview_text, strip_markdown, DEFAULT_EXCERPT_CHARS};
pub use repository::ContentRepository;
pub use splitter::{
    split, split_body, SplitContent, DEFAULT_FREE_CHARS, DEFAULT_FREE_SECTIONS,
    DEFAULT_MARKER_PREVIEW_CHARS, MORE_MARKER,
};

#[cfg(test)]
pub use repository::MockContentRepository;
