//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::cache::Cache;
use crate::domain::comment::CommentRepository;
use crate::domain::settings::SettingsRepository;
use crate::infrastructure::access::AccessOrchestrator;
use crate::infrastructure::api_key::ApiKeyService;

use super::middleware::AdminCredentials;

/// Explicitly constructed context handed to every request
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AccessOrchestrator>,
    pub api_key_service: ApiKeyService,
    pub comments: Arc<dyn CommentRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub cache: Arc<dyn Cache>,
    pub admin: AdminCredentials,
}
