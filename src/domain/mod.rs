//! Domain layer - Core business logic and entities

pub mod access;
pub mod api_key;
pub mod cache;
pub mod comment;
pub mod content;
pub mod error;
pub mod settings;
pub mod storage;
pub mod verification;

pub use access::{AccessError, SubmissionStage};
pub use api_key::{ApiKey, ApiKeyId, ApiKeyRepository, AuthenticatedKey};
pub use cache::{Cache, CacheExt};
pub use comment::{Comment, CommentId, CommentRepository, CommentStatus};
pub use content::{
    ContentId, ContentItem, ContentRepository, ContentStatus, FreePreviewMode, PaywallConfig,
    SplitContent,
};
pub use error::DomainError;
pub use settings::{ModerationPolicy, SettingsRepository, SiteSettings};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use verification::HumanVerifier;
